//! The single translation layer between typed [`FieldValue`] maps and the
//! store's JSON property format. Property names and JSON shapes stay
//! confined to this module and `model::keys`.

use serde_json::{json, Map, Value};

use crate::model::{FieldMap, FieldValue};

/// Render a field map as a store `properties` object.
pub fn to_properties(fields: &FieldMap) -> Value {
    let mut out = Map::new();
    for (name, value) in fields {
        let prop = match value {
            FieldValue::Title(text) => json!({
                "title": [{ "text": { "content": text } }]
            }),
            FieldValue::Text(text) => json!({
                "rich_text": [{ "text": { "content": text } }]
            }),
            FieldValue::Date(start) => json!({
                "date": { "start": start }
            }),
            FieldValue::Url(url) => json!({ "url": url }),
            FieldValue::Select(option) => json!({
                "select": { "name": option }
            }),
            FieldValue::Relation(page_id) => json!({
                "relation": [{ "id": page_id }]
            }),
        };
        out.insert(name.clone(), prop);
    }
    Value::Object(out)
}

/// Exact-match filter on a single text property. The store also offers a
/// `contains` filter; it is never used here, because `"abc"` would then
/// match a stored `"abc123"`.
pub fn equals_filter(property: &str, value: &str) -> Value {
    json!({
        "filter": {
            "property": property,
            "rich_text": { "equals": value }
        },
        "page_size": 1
    })
}

/// External-file descriptor used for page icons and covers.
pub fn external_file(url: &str) -> Value {
    json!({
        "type": "external",
        "external": { "url": url }
    })
}

/// Read a page object's `properties` back into a field map. Properties of
/// kinds this system does not write, and empty values, are left out.
pub fn fields_from_page(page: &Value) -> FieldMap {
    let mut fields = FieldMap::new();
    let Some(properties) = page.get("properties").and_then(Value::as_object) else {
        return fields;
    };
    for (name, prop) in properties {
        let parsed = match prop.get("type").and_then(Value::as_str) {
            Some("title") => first_text_content(prop.get("title")).map(FieldValue::Title),
            Some("rich_text") => first_text_content(prop.get("rich_text")).map(FieldValue::Text),
            Some("date") => prop
                .pointer("/date/start")
                .and_then(Value::as_str)
                .map(|s| FieldValue::Date(s.to_string())),
            Some("url") => prop
                .get("url")
                .and_then(Value::as_str)
                .map(|s| FieldValue::Url(s.to_string())),
            Some("select") => prop
                .pointer("/select/name")
                .and_then(Value::as_str)
                .map(|s| FieldValue::Select(s.to_string())),
            Some("relation") => prop
                .pointer("/relation/0/id")
                .and_then(Value::as_str)
                .map(|s| FieldValue::Relation(s.to_string())),
            _ => None,
        };
        if let Some(value) = parsed {
            fields.insert(name.clone(), value);
        }
    }
    fields
}

/// Plain text of the first rich-text span, preferring the write-side
/// `text.content` shape and falling back to `plain_text`.
fn first_text_content(spans: Option<&Value>) -> Option<String> {
    let first = spans?.as_array()?.first()?;
    first
        .pointer("/text/content")
        .or_else(|| first.get("plain_text"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}
