use std::collections::HashMap;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::config::SyncConfig;
use crate::model::UpsertOutcome;
use crate::normalization::video::{normalize_channel, normalize_video};
use crate::providers::youtube::RawVideo;
use crate::sync::resolver::resolve_channel;
use crate::sync::upsert::upsert_video;
use crate::sync::{Catalog, RecordStore};

/// End-of-run accounting. `failed` covers per-item errors, whole skipped
/// chunks, ids the catalog did not return, and videos skipped for a
/// missing owner relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

/// Drives the full pipeline over a list of video ids: chunked catalog
/// fetches, normalization, channel resolution and the video upsert, with
/// every failure contained at the item (or chunk) boundary.
pub struct SyncEngine<C, S> {
    catalog: C,
    store: S,
    config: SyncConfig,
}

impl<C: Catalog, S: RecordStore> SyncEngine<C, S> {
    pub fn new(catalog: C, store: S, config: SyncConfig) -> Self {
        Self {
            catalog,
            store,
            config,
        }
    }

    /// Process every id, sequentially, and report the outcome counts.
    /// The only error this returns is the empty-input validation failure;
    /// it occurs before any remote call.
    pub async fn run(&self, ids: &[String]) -> Result<SyncSummary> {
        if ids.is_empty() {
            bail!("no video ids supplied");
        }

        let mut summary = SyncSummary {
            total: ids.len(),
            ..SyncSummary::default()
        };

        for chunk in ids.chunks(self.config.batch_size.max(1)) {
            let items = match self.catalog.fetch_items(chunk).await {
                Ok(items) => items,
                Err(err) => {
                    warn!(target: "sync", size = chunk.len(), %err, "chunk fetch failed, skipping chunk");
                    summary.failed += chunk.len();
                    continue;
                }
            };

            let by_id: HashMap<&str, &RawVideo> =
                items.iter().map(|item| (item.id.as_str(), item)).collect();

            for id in chunk {
                let Some(raw) = by_id.get(id.as_str()).copied() else {
                    warn!(target: "sync", video = %id, "catalog returned no item for id");
                    summary.failed += 1;
                    continue;
                };
                match self.process_item(raw).await {
                    Ok(UpsertOutcome::Skipped) => summary.failed += 1,
                    Ok(_) => summary.succeeded += 1,
                    Err(err) => {
                        warn!(target: "sync", video = %id, %err, "video sync failed");
                        summary.failed += 1;
                    }
                }
            }
        }

        info!(
            target: "sync",
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "run complete"
        );
        Ok(summary)
    }

    /// Normalize one raw item, resolve its channel and upsert the video.
    /// Channel and category lookups are best-effort: their failure leaves
    /// the corresponding fields unset rather than failing the item.
    async fn process_item(&self, raw: &RawVideo) -> Result<UpsertOutcome> {
        let channel_detail = match self.catalog.fetch_channel(&raw.snippet.channel_id).await {
            Ok(detail) => detail,
            Err(err) => {
                warn!(target: "sync", channel = %raw.snippet.channel_id, %err, "channel lookup failed");
                None
            }
        };
        let category_name = match self.catalog.fetch_category(&raw.snippet.category_id).await {
            Ok(name) => name,
            Err(err) => {
                warn!(target: "sync", category = %raw.snippet.category_id, %err, "category lookup failed");
                None
            }
        };

        let video = normalize_video(raw, category_name);
        let channel = normalize_channel(raw, channel_detail.as_ref());

        let owner = match resolve_channel(&self.store, &self.config.channel_database_id, &channel)
            .await
        {
            Ok(page) => Some(page),
            Err(err) => {
                warn!(target: "sync", channel = %channel.id, %err, "channel resolution failed");
                None
            }
        };

        upsert_video(
            &self.store,
            &self.config.video_database_id,
            &video,
            owner.as_ref(),
        )
        .await
    }
}
