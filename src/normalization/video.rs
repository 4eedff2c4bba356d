//! Catalog metadata normalization: raw API payloads in, canonical
//! [`Video`]/[`Channel`] records out. Nothing in here touches the network
//! and nothing in here fails; malformed source values fall back to
//! deterministic substitutes.

use chrono::{FixedOffset, NaiveDateTime, Utc};
use tracing::warn;

use crate::model::{Channel, Video};
use crate::providers::youtube::{RawChannel, RawVideo, ThumbnailSet};

/// Rendered when a duration string cannot be parsed.
pub const UNKNOWN_DURATION: &str = "unknown";
/// Rendered when every duration component is zero.
pub const ZERO_DURATION: &str = "0 secs";

/// Timestamps are stored in IST, a fixed +05:30 offset.
const TARGET_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Format the catalog publishes timestamps in.
const CATALOG_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%SZ";
/// Format written to the store: millisecond precision, trailing Z.
const STORE_TIMESTAMP: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

fn target_offset() -> FixedOffset {
    FixedOffset::east_opt(TARGET_OFFSET_SECS).expect("offset is within +/-24h")
}

/// Convert a catalog timestamp to the store's IST millisecond format.
/// A value that does not parse is replaced with the current time, so a
/// single bad record never aborts its batch.
pub fn normalize_timestamp(raw: &str) -> String {
    match NaiveDateTime::parse_from_str(raw, CATALOG_TIMESTAMP) {
        Ok(parsed) => parsed
            .and_utc()
            .with_timezone(&target_offset())
            .format(STORE_TIMESTAMP)
            .to_string(),
        Err(err) => {
            warn!(target: "normalize", raw, %err, "unparseable publish timestamp, substituting now");
            Utc::now()
                .with_timezone(&target_offset())
                .format(STORE_TIMESTAMP)
                .to_string()
        }
    }
}

/// Render an ISO-8601 duration as a human-readable string, e.g.
/// `PT1H5M30S` -> `"1 hours 5 mins 30 secs"`. Zero components are left
/// out; an all-zero duration renders as [`ZERO_DURATION`] and anything
/// unparseable as [`UNKNOWN_DURATION`].
pub fn format_duration(iso: &str) -> String {
    let Some(total_secs) = parse_iso_duration(iso) else {
        return UNKNOWN_DURATION.to_string();
    };
    let hours = total_secs / 3600;
    let mins = total_secs % 3600 / 60;
    let secs = total_secs % 60;
    let mut parts = Vec::new();
    if hours > 0 {
        parts.push(format!("{hours} hours"));
    }
    if mins > 0 {
        parts.push(format!("{mins} mins"));
    }
    if secs > 0 {
        parts.push(format!("{secs} secs"));
    }
    if parts.is_empty() {
        ZERO_DURATION.to_string()
    } else {
        parts.join(" ")
    }
}

/// Parse `P[nD]T[nH][nM][nS]` into a total number of seconds, so
/// unnormalized inputs like `PT90M` still decompose into whole
/// hours/minutes/seconds. Returns None on anything malformed.
fn parse_iso_duration(iso: &str) -> Option<u64> {
    let rest = iso.strip_prefix('P')?;
    let (date_part, time_part) = match rest.split_once('T') {
        Some((d, t)) => (d, t),
        None => (rest, ""),
    };

    let mut total = 0u64;
    for (value, unit) in components(date_part)? {
        match unit {
            'D' => total += value * 86_400,
            _ => return None,
        }
    }
    for (value, unit) in components(time_part)? {
        match unit {
            'H' => total += value * 3600,
            'M' => total += value * 60,
            'S' => total += value,
            _ => return None,
        }
    }
    Some(total)
}

/// Split "1H5M30S" into (value, unit) pairs; None on stray characters.
fn components(part: &str) -> Option<Vec<(u64, char)>> {
    let mut out = Vec::new();
    let mut digits = String::new();
    for ch in part.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
        } else if digits.is_empty() {
            return None;
        } else {
            out.push((digits.parse().ok()?, ch));
            digits.clear();
        }
    }
    if digits.is_empty() { Some(out) } else { None }
}

/// Best available video thumbnail, highest resolution first.
pub fn pick_video_thumbnail(set: &ThumbnailSet) -> Option<String> {
    [&set.maxres, &set.standard, &set.high, &set.medium, &set.fallback]
        .into_iter()
        .find_map(|tier| tier.as_ref().map(|t| t.url.clone()))
}

/// Best available channel logo. Channels only publish the lower tiers.
pub fn pick_channel_logo(set: &ThumbnailSet) -> Option<String> {
    [&set.high, &set.medium, &set.fallback]
        .into_iter()
        .find_map(|tier| tier.as_ref().map(|t| t.url.clone()))
}

/// Canonical watch URL for a video id.
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={video_id}")
}

/// Public channel URL from the ecosystem path fragment (e.g. "@handle").
pub fn channel_url(fragment: &str) -> String {
    format!("https://www.youtube.com/{fragment}")
}

/// Build the canonical [`Video`] record from a raw catalog item plus the
/// (optional) category lookup result. Missing lookups leave the
/// corresponding fields absent; this function never fails.
pub fn normalize_video(raw: &RawVideo, category_name: Option<String>) -> Video {
    Video {
        id: raw.id.clone(),
        title: raw.snippet.title.clone(),
        published_at: normalize_timestamp(&raw.snippet.published_at),
        channel_id: raw.snippet.channel_id.clone(),
        channel_name: raw.snippet.channel_title.clone(),
        duration: format_duration(&raw.content_details.duration),
        thumbnail_url: pick_video_thumbnail(&raw.snippet.thumbnails),
        category_id: raw.snippet.category_id.clone(),
        category_name: category_name.filter(|name| !name.is_empty()),
        url: watch_url(&raw.id),
    }
}

/// Build the owning [`Channel`] record for a raw catalog item. The channel
/// detail lookup is optional; without it the record carries only what the
/// video snippet knows.
pub fn normalize_channel(raw: &RawVideo, detail: Option<&RawChannel>) -> Channel {
    Channel {
        id: raw.snippet.channel_id.clone(),
        name: raw.snippet.channel_title.clone(),
        logo_url: detail.and_then(|d| pick_channel_logo(&d.thumbnails)),
        custom_url: detail
            .and_then(|d| d.custom_url.as_deref())
            .filter(|fragment| !fragment.is_empty())
            .map(channel_url),
    }
}
