use anyhow::{bail, Result};

use crate::util::env;

/// The catalog accepts at most this many ids per batch fetch.
pub const MAX_BATCH_SIZE: usize = 50;
pub const DEFAULT_BATCH_SIZE: usize = MAX_BATCH_SIZE;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Run configuration. Loaded once at process start, validated, then held
/// immutably for the duration of the run.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub youtube_api_key: String,
    pub notion_api_key: String,
    /// Store database holding the video pages.
    pub video_database_id: String,
    /// Store database holding the channel pages.
    pub channel_database_id: String,
    /// Ids per catalog fetch, 1..=MAX_BATCH_SIZE.
    pub batch_size: usize,
    pub http_timeout_secs: u64,
}

impl SyncConfig {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            youtube_api_key: env::env_req("YOUTUBE_API_KEY")?,
            notion_api_key: env::env_req("NOTION_API_KEY")?,
            video_database_id: env::env_req("NOTION_VIDEO_DATABASE_ID")?,
            channel_database_id: env::env_req("NOTION_CHANNEL_DATABASE_ID")?,
            batch_size: env::env_parse("SYNC_BATCH_SIZE", DEFAULT_BATCH_SIZE),
            http_timeout_secs: env::env_parse("SYNC_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.youtube_api_key.is_empty() || self.notion_api_key.is_empty() {
            bail!("API keys must not be empty");
        }
        if self.video_database_id.is_empty() || self.channel_database_id.is_empty() {
            bail!("store database ids must not be empty");
        }
        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            bail!(
                "batch size {} out of range 1..={MAX_BATCH_SIZE}",
                self.batch_size
            );
        }
        if self.http_timeout_secs == 0 {
            bail!("http timeout must be at least 1s");
        }
        Ok(())
    }
}
