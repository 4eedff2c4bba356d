use std::collections::BTreeMap;

use serde::Serialize;

/// Maximum length the remote store accepts for a single text value.
/// Longer titles are cut before any write.
pub const MAX_TEXT_LEN: usize = 2000;

/// Property names used in the remote store. Kept in one place so the
/// stringly-typed names never leak past the serialization boundary.
pub mod keys {
    pub const NAME: &str = "Name";
    pub const VIDEO_ID: &str = "Video Id";
    pub const DATE: &str = "Date";
    pub const DURATION: &str = "Duration";
    pub const THUMBNAIL: &str = "Thumbnail";
    pub const URL: &str = "URL";
    pub const CATEGORY_ID: &str = "Category Id";
    pub const CATEGORY_NAME: &str = "Category Name";
    pub const CHANNEL: &str = "Channel";
    pub const CHANNEL_ID: &str = "Channel Id";
}

/// One normalized catalog item, ready to be written to the store.
/// `id` is the identity key; every other field is re-derived on each run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    /// Publish timestamp already converted to the target timezone,
    /// millisecond precision with a trailing `Z`.
    pub published_at: String,
    pub channel_id: String,
    pub channel_name: String,
    /// Human-readable duration, e.g. "1 hours 5 mins 30 secs".
    pub duration: String,
    pub thumbnail_url: Option<String>,
    pub category_id: String,
    pub category_name: Option<String>,
    pub url: String,
}

/// The owning channel of one or more videos. `id` is the identity key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub logo_url: Option<String>,
    pub custom_url: Option<String>,
}

/// Opaque handle to a page materialized in the remote store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
}

impl PageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Result of a single media upsert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Created,
    Updated,
    Unchanged,
    /// Owner resolution failed upstream; nothing was written.
    Skipped,
}

/// A store property value. Variants mirror the property kinds the store
/// exposes; equality is exact, which is what the diff gate relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Title(String),
    Text(String),
    Date(String),
    Url(String),
    Select(String),
    Relation(String),
}

/// Field bag exchanged with the store. Optional source fields are simply
/// absent from the map rather than carried as empty values.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Payload for a page create or update: the properties plus the optional
/// page decorations the store supports.
#[derive(Debug, Clone, Default)]
pub struct PageWrite {
    pub fields: FieldMap,
    pub icon_url: Option<String>,
    pub cover_url: Option<String>,
}

/// Cut `text` to at most `MAX_TEXT_LEN` characters on a char boundary.
pub fn clamp_text(text: &str) -> String {
    match text.char_indices().nth(MAX_TEXT_LEN) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

impl Video {
    /// Map the record onto store properties. The relation to the owning
    /// channel is attached separately at creation time.
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(keys::NAME.into(), FieldValue::Title(clamp_text(&self.title)));
        fields.insert(keys::VIDEO_ID.into(), FieldValue::Text(self.id.clone()));
        fields.insert(keys::DATE.into(), FieldValue::Date(self.published_at.clone()));
        fields.insert(keys::DURATION.into(), FieldValue::Text(self.duration.clone()));
        if let Some(url) = &self.thumbnail_url {
            fields.insert(keys::THUMBNAIL.into(), FieldValue::Url(url.clone()));
        }
        fields.insert(keys::URL.into(), FieldValue::Url(self.url.clone()));
        fields.insert(
            keys::CATEGORY_ID.into(),
            FieldValue::Select(self.category_id.clone()),
        );
        if let Some(name) = &self.category_name {
            fields.insert(keys::CATEGORY_NAME.into(), FieldValue::Select(name.clone()));
        }
        fields
    }
}

impl Channel {
    pub fn to_fields(&self) -> FieldMap {
        let mut fields = FieldMap::new();
        fields.insert(keys::NAME.into(), FieldValue::Title(clamp_text(&self.name)));
        fields.insert(keys::CHANNEL_ID.into(), FieldValue::Text(self.id.clone()));
        if let Some(url) = &self.custom_url {
            fields.insert(keys::URL.into(), FieldValue::Url(url.clone()));
        }
        fields
    }
}
