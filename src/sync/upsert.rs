use anyhow::Result;
use tracing::{debug, info, warn};

use crate::model::{keys, FieldValue, PageRef, PageWrite, UpsertOutcome, Video};
use crate::sync::diff::changed_fields;
use crate::sync::RecordStore;

/// Reconcile one normalized video against the store.
///
/// A video page is never created without its channel relation: when the
/// owner could not be resolved upstream the record is skipped outright,
/// before any store call. Otherwise the video is looked up by its
/// identity key (exact match), created with all fields and the relation
/// when absent, and updated with only the changed fields when stale.
pub async fn upsert_video<S: RecordStore + ?Sized>(
    store: &S,
    database_id: &str,
    video: &Video,
    owner: Option<&PageRef>,
) -> Result<UpsertOutcome> {
    let Some(owner) = owner else {
        warn!(target: "sync", video = %video.id, "owner unresolved, skipping video");
        return Ok(UpsertOutcome::Skipped);
    };

    let incoming = video.to_fields();

    if let Some(page) = store
        .find_page(database_id, keys::VIDEO_ID, &video.id)
        .await?
    {
        let existing = store.page_fields(&page).await?;
        let changed = changed_fields(&existing, &incoming);
        if changed.is_empty() {
            debug!(target: "sync", video = %video.id, "video up to date");
            return Ok(UpsertOutcome::Unchanged);
        }

        let mut fields = incoming;
        fields.retain(|name, _| changed.contains(name) || name == keys::VIDEO_ID);
        fields
            .entry(keys::VIDEO_ID.to_string())
            .or_insert_with(|| FieldValue::Text(video.id.clone()));
        let write = PageWrite {
            fields,
            icon_url: None,
            cover_url: video.thumbnail_url.clone(),
        };
        store.update_page(&page, &write).await?;
        info!(target: "sync", video = %video.id, fields = ?changed, "video updated");
        return Ok(UpsertOutcome::Updated);
    }

    let mut fields = incoming;
    fields.insert(
        keys::CHANNEL.to_string(),
        FieldValue::Relation(owner.id.clone()),
    );
    let write = PageWrite {
        fields,
        icon_url: None,
        cover_url: video.thumbnail_url.clone(),
    };
    let page = store.create_page(database_id, &write).await?;
    info!(target: "sync", video = %video.id, page = %page.id, "video created");
    Ok(UpsertOutcome::Created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::testing::MockStore;

    fn video() -> Video {
        Video {
            id: "vid1".into(),
            title: "First".into(),
            published_at: "2024-01-15T15:30:00.000Z".into(),
            channel_id: "chanA".into(),
            channel_name: "Channel A".into(),
            duration: "4 mins 13 secs".into(),
            thumbnail_url: Some("https://img/max.jpg".into()),
            category_id: "22".into(),
            category_name: Some("People & Blogs".into()),
            url: "https://www.youtube.com/watch?v=vid1".into(),
        }
    }

    fn owner() -> PageRef {
        PageRef::new("chan-page-1")
    }

    #[tokio::test]
    async fn missing_owner_skips_without_store_calls() {
        let store = MockStore::default();
        let outcome = upsert_video(&store, "vid-db", &video(), None).await.unwrap();
        assert_eq!(outcome, UpsertOutcome::Skipped);
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn create_then_unchanged_is_idempotent() {
        let store = MockStore::default();
        let owner = owner();

        let first = upsert_video(&store, "vid-db", &video(), Some(&owner))
            .await
            .unwrap();
        assert_eq!(first, UpsertOutcome::Created);

        let second = upsert_video(&store, "vid-db", &video(), Some(&owner))
            .await
            .unwrap();
        assert_eq!(second, UpsertOutcome::Unchanged);
        assert_eq!(store.creates(), 1);
        assert_eq!(store.updates(), 0);
        // One lookup per call; the second also reads the page for the diff.
        assert_eq!(store.finds(), 2);
        assert_eq!(store.gets(), 1);
    }

    #[tokio::test]
    async fn create_attaches_relation_and_cover() {
        let store = MockStore::default();
        let owner = owner();
        upsert_video(&store, "vid-db", &video(), Some(&owner))
            .await
            .unwrap();

        let page = store
            .page(&PageRef::new("page-1"))
            .expect("page was created");
        assert_eq!(
            page.fields.get(keys::CHANNEL),
            Some(&FieldValue::Relation("chan-page-1".into()))
        );
        assert_eq!(page.write.cover_url.as_deref(), Some("https://img/max.jpg"));
    }

    #[tokio::test]
    async fn video_without_thumbnail_gets_no_cover() {
        let store = MockStore::default();
        let owner = owner();
        let mut bare = video();
        bare.thumbnail_url = None;
        upsert_video(&store, "vid-db", &bare, Some(&owner))
            .await
            .unwrap();
        let page = store.page(&PageRef::new("page-1")).unwrap();
        assert_eq!(page.write.cover_url, None);
        assert!(!page.fields.contains_key(keys::THUMBNAIL));
    }

    #[tokio::test]
    async fn stale_video_updates_only_changed_fields() {
        let store = MockStore::default();
        let owner = owner();
        upsert_video(&store, "vid-db", &video(), Some(&owner))
            .await
            .unwrap();

        let mut longer = video();
        longer.duration = "5 mins 2 secs".into();
        let outcome = upsert_video(&store, "vid-db", &longer, Some(&owner))
            .await
            .unwrap();
        assert_eq!(outcome, UpsertOutcome::Updated);

        let page = store.page(&PageRef::new("page-1")).unwrap();
        assert_eq!(
            page.write.fields.get(keys::DURATION),
            Some(&FieldValue::Text("5 mins 2 secs".into()))
        );
        // Identity travels with the update; unchanged fields do not.
        assert!(page.write.fields.contains_key(keys::VIDEO_ID));
        assert!(!page.write.fields.contains_key(keys::NAME));
        // The relation is never rewritten after creation.
        assert!(!page.write.fields.contains_key(keys::CHANNEL));
        assert_eq!(
            page.fields.get(keys::CHANNEL),
            Some(&FieldValue::Relation("chan-page-1".into()))
        );
    }

    #[tokio::test]
    async fn exact_match_does_not_hit_prefix_ids() {
        let store = MockStore::default();
        let owner = owner();
        let mut prefixed = video();
        prefixed.id = "abc123".into();
        prefixed.url = "https://www.youtube.com/watch?v=abc123".into();
        upsert_video(&store, "vid-db", &prefixed, Some(&owner))
            .await
            .unwrap();

        let mut short = video();
        short.id = "abc".into();
        short.url = "https://www.youtube.com/watch?v=abc".into();
        let outcome = upsert_video(&store, "vid-db", &short, Some(&owner))
            .await
            .unwrap();
        // "abc" must not resolve to the stored "abc123" page.
        assert_eq!(outcome, UpsertOutcome::Created);
        assert_eq!(store.creates(), 2);
    }

    #[tokio::test]
    async fn create_failure_propagates_as_error() {
        let store = MockStore::default();
        store
            .fail_creates
            .store(true, std::sync::atomic::Ordering::Relaxed);
        let owner = owner();
        let result = upsert_video(&store, "vid-db", &video(), Some(&owner)).await;
        assert!(result.is_err());
    }
}
