use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::sync::Catalog;

/// YouTube Data API v3 catalog client.
///
/// Endpoints used:
/// - GET /videos?part=snippet,contentDetails&id=... - batch video metadata
/// - GET /channels?part=snippet,brandingSettings&id=... - channel details
/// - GET /videoCategories?part=snippet&id=... - category name lookup
///
/// `videos` accepts up to 50 comma-joined ids per call; the orchestrator
/// chunks its input accordingly.
#[derive(Debug, Clone)]
pub struct YoutubeProvider {
    base_url: String,
    http: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default)]
    items: Vec<T>,
}

/// One item of a `videos.list` response, limited to the parts we request.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawVideo {
    pub id: String,
    #[serde(default)]
    pub snippet: RawSnippet,
    #[serde(default)]
    pub content_details: RawContentDetails,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSnippet {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub published_at: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub channel_title: String,
    #[serde(default)]
    pub category_id: String,
    #[serde(default)]
    pub thumbnails: ThumbnailSet,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawContentDetails {
    #[serde(default)]
    pub duration: String,
}

/// Thumbnails keyed by resolution tier. All tiers are optional; the
/// normalizer picks the best available one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThumbnailSet {
    pub maxres: Option<Thumbnail>,
    pub standard: Option<Thumbnail>,
    pub high: Option<Thumbnail>,
    pub medium: Option<Thumbnail>,
    #[serde(rename = "default")]
    pub fallback: Option<Thumbnail>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Channel snippet subset from `channels.list`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawChannel {
    #[serde(default)]
    pub title: String,
    pub custom_url: Option<String>,
    #[serde(default)]
    pub thumbnails: ThumbnailSet,
}

#[derive(Debug, Default, Deserialize)]
struct ChannelItem {
    #[serde(default)]
    snippet: RawChannel,
}

#[derive(Debug, Default, Deserialize)]
struct CategoryItem {
    #[serde(default)]
    snippet: CategorySnippet,
}

#[derive(Debug, Default, Deserialize)]
struct CategorySnippet {
    #[serde(default)]
    title: String,
}

impl YoutubeProvider {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .user_agent("tubesync/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            http,
            api_key: api_key.into(),
        })
    }

    /// Override the API base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn list<T: for<'de> Deserialize<'de> + Default>(
        &self,
        resource: &str,
        part: &str,
        ids: &str,
    ) -> Result<Vec<T>> {
        let url = format!("{}/{resource}", self.base_url);
        debug!(target: "youtube", resource, ids, "catalog request");
        let resp = self
            .http
            .get(&url)
            .query(&[("part", part), ("id", ids), ("key", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("{resource} request failed"))?
            .error_for_status()
            .with_context(|| format!("{resource} request rejected"))?;
        let body: ListResponse<T> = resp
            .json()
            .await
            .with_context(|| format!("{resource} response did not parse"))?;
        Ok(body.items)
    }
}

#[async_trait]
impl Catalog for YoutubeProvider {
    async fn fetch_items(&self, ids: &[String]) -> Result<Vec<RawVideo>> {
        self.list("videos", "snippet,contentDetails", &ids.join(","))
            .await
    }

    async fn fetch_channel(&self, channel_id: &str) -> Result<Option<RawChannel>> {
        let items: Vec<ChannelItem> = self
            .list("channels", "snippet,brandingSettings", channel_id)
            .await?;
        Ok(items.into_iter().next().map(|item| item.snippet))
    }

    async fn fetch_category(&self, category_id: &str) -> Result<Option<String>> {
        let items: Vec<CategoryItem> = self.list("videoCategories", "snippet", category_id).await?;
        Ok(items
            .into_iter()
            .next()
            .map(|item| item.snippet.title)
            .filter(|title| !title.is_empty()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_payload_parses() {
        let body = serde_json::json!({
            "kind": "youtube#videoListResponse",
            "items": [{
                "id": "vid1",
                "snippet": {
                    "title": "First",
                    "publishedAt": "2024-01-15T10:00:00Z",
                    "channelId": "chanA",
                    "channelTitle": "Channel A",
                    "categoryId": "22",
                    "thumbnails": {
                        "high": { "url": "https://img/h.jpg", "width": 480, "height": 360 }
                    }
                },
                "contentDetails": { "duration": "PT1H5M30S" }
            }]
        });
        let parsed: ListResponse<RawVideo> = serde_json::from_value(body).unwrap();
        let video = &parsed.items[0];
        assert_eq!(video.id, "vid1");
        assert_eq!(video.snippet.channel_id, "chanA");
        assert_eq!(video.content_details.duration, "PT1H5M30S");
        assert_eq!(
            video.snippet.thumbnails.high.as_ref().map(|t| t.url.as_str()),
            Some("https://img/h.jpg")
        );
        assert!(video.snippet.thumbnails.maxres.is_none());
    }

    #[test]
    fn channel_payload_parses_without_custom_url() {
        let body = serde_json::json!({
            "items": [{
                "id": "chanA",
                "snippet": {
                    "title": "Channel A",
                    "thumbnails": { "default": { "url": "https://img/d.jpg" } }
                }
            }]
        });
        let parsed: ListResponse<ChannelItem> = serde_json::from_value(body).unwrap();
        let chan = &parsed.items[0].snippet;
        assert_eq!(chan.title, "Channel A");
        assert!(chan.custom_url.is_none());
        assert!(chan.thumbnails.fallback.is_some());
    }

    #[test]
    fn empty_response_yields_no_items() {
        let parsed: ListResponse<RawVideo> = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(parsed.items.is_empty());
    }
}
