use anyhow::Result;
use tracing::{debug, info};

use crate::model::{keys, Channel, FieldValue, PageRef, PageWrite};
use crate::sync::diff::changed_fields;
use crate::sync::RecordStore;

/// Resolve a channel to its store page, creating or refreshing it as
/// needed. Looks the channel up by its identity key, creates the page
/// with all current fields when absent, and issues a diff-gated update
/// when present but stale. At most one query and one write per call;
/// calling again with unchanged input performs no write.
pub async fn resolve_channel<S: RecordStore + ?Sized>(
    store: &S,
    database_id: &str,
    channel: &Channel,
) -> Result<PageRef> {
    let incoming = channel.to_fields();

    if let Some(page) = store
        .find_page(database_id, keys::CHANNEL_ID, &channel.id)
        .await?
    {
        let existing = store.page_fields(&page).await?;
        let changed = changed_fields(&existing, &incoming);
        if changed.is_empty() {
            debug!(target: "sync", channel = %channel.id, "channel up to date");
            return Ok(page);
        }

        let mut fields = incoming;
        fields.retain(|name, _| changed.contains(name) || name == keys::CHANNEL_ID);
        fields
            .entry(keys::CHANNEL_ID.to_string())
            .or_insert_with(|| FieldValue::Text(channel.id.clone()));
        let write = PageWrite {
            fields,
            icon_url: channel.logo_url.clone(),
            cover_url: None,
        };
        store.update_page(&page, &write).await?;
        info!(target: "sync", channel = %channel.id, fields = ?changed, "channel updated");
        return Ok(page);
    }

    let write = PageWrite {
        fields: incoming,
        icon_url: channel.logo_url.clone(),
        cover_url: None,
    };
    let page = store.create_page(database_id, &write).await?;
    info!(target: "sync", channel = %channel.id, page = %page.id, "channel created");
    Ok(page)
}
