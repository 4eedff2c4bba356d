//! The reconciliation engine: collaborator seams, diff gate, entity
//! resolver, media upsert, and the batch orchestrator driving them.

pub mod diff;
pub mod orchestrator;
pub mod resolver;
pub mod upsert;

use anyhow::Result;
use async_trait::async_trait;

use crate::model::{FieldMap, PageRef, PageWrite};
use crate::providers::youtube::{RawChannel, RawVideo};

/// Read side: the external catalog the records originate from.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Fetch raw metadata for a batch of ids in a single call.
    /// Ids unknown to the catalog are simply absent from the result.
    async fn fetch_items(&self, ids: &[String]) -> Result<Vec<RawVideo>>;

    /// Channel details for the owning-entity record; None when the
    /// catalog does not know the channel.
    async fn fetch_channel(&self, channel_id: &str) -> Result<Option<RawChannel>>;

    /// Display name for a category id, if the catalog has one.
    async fn fetch_category(&self, category_id: &str) -> Result<Option<String>>;
}

/// Write side: the remote structured store that is the system of record.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Find the page whose `property` exactly equals `value`. Exact match
    /// only; `"abc"` must not match a stored `"abc123"`.
    async fn find_page(
        &self,
        database_id: &str,
        property: &str,
        value: &str,
    ) -> Result<Option<PageRef>>;

    /// Current property values of an existing page.
    async fn page_fields(&self, page: &PageRef) -> Result<FieldMap>;

    async fn create_page(&self, database_id: &str, write: &PageWrite) -> Result<PageRef>;

    async fn update_page(&self, page: &PageRef, write: &PageWrite) -> Result<()>;
}

/// In-memory collaborator doubles shared by the engine tests.
#[cfg(test)]
pub(crate) mod testing {
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use async_trait::async_trait;

    use crate::model::{FieldMap, FieldValue, PageRef, PageWrite};
    use crate::providers::youtube::{RawChannel, RawVideo};

    use super::{Catalog, RecordStore};

    #[derive(Debug, Clone)]
    pub struct StoredPage {
        pub database_id: String,
        /// Merged current property state, as the real store would hold it.
        pub fields: FieldMap,
        /// The most recent create/update payload, for asserting on what
        /// was actually sent.
        pub write: PageWrite,
    }

    #[derive(Debug, Default)]
    struct Calls {
        finds: usize,
        gets: usize,
        creates: usize,
        updates: usize,
    }

    #[derive(Default)]
    pub struct MockStore {
        pages: Mutex<BTreeMap<String, StoredPage>>,
        calls: Mutex<Calls>,
        pub fail_creates: AtomicBool,
    }

    impl MockStore {
        pub fn finds(&self) -> usize {
            self.calls.lock().unwrap().finds
        }

        pub fn gets(&self) -> usize {
            self.calls.lock().unwrap().gets
        }

        pub fn creates(&self) -> usize {
            self.calls.lock().unwrap().creates
        }

        pub fn updates(&self) -> usize {
            self.calls.lock().unwrap().updates
        }

        pub fn total_calls(&self) -> usize {
            let calls = self.calls.lock().unwrap();
            calls.finds + calls.gets + calls.creates + calls.updates
        }

        pub fn page(&self, page: &PageRef) -> Option<StoredPage> {
            self.pages.lock().unwrap().get(&page.id).cloned()
        }

        pub fn pages_in(&self, database_id: &str) -> usize {
            self.pages
                .lock()
                .unwrap()
                .values()
                .filter(|p| p.database_id == database_id)
                .count()
        }
    }

    fn raw_value(value: &FieldValue) -> &str {
        match value {
            FieldValue::Title(s)
            | FieldValue::Text(s)
            | FieldValue::Date(s)
            | FieldValue::Url(s)
            | FieldValue::Select(s)
            | FieldValue::Relation(s) => s,
        }
    }

    #[async_trait]
    impl RecordStore for MockStore {
        async fn find_page(
            &self,
            database_id: &str,
            property: &str,
            value: &str,
        ) -> Result<Option<PageRef>> {
            self.calls.lock().unwrap().finds += 1;
            let pages = self.pages.lock().unwrap();
            Ok(pages
                .iter()
                .find(|(_, p)| {
                    p.database_id == database_id
                        && p.fields
                            .get(property)
                            .is_some_and(|v| raw_value(v) == value)
                })
                .map(|(id, _)| PageRef::new(id.clone())))
        }

        async fn page_fields(&self, page: &PageRef) -> Result<FieldMap> {
            self.calls.lock().unwrap().gets += 1;
            let pages = self.pages.lock().unwrap();
            match pages.get(&page.id) {
                Some(stored) => Ok(stored.fields.clone()),
                None => bail!("no such page {}", page.id),
            }
        }

        async fn create_page(&self, database_id: &str, write: &PageWrite) -> Result<PageRef> {
            self.calls.lock().unwrap().creates += 1;
            if self.fail_creates.load(Ordering::Relaxed) {
                bail!("store rejected create");
            }
            let mut pages = self.pages.lock().unwrap();
            let id = format!("page-{}", pages.len() + 1);
            pages.insert(
                id.clone(),
                StoredPage {
                    database_id: database_id.to_string(),
                    fields: write.fields.clone(),
                    write: write.clone(),
                },
            );
            Ok(PageRef::new(id))
        }

        async fn update_page(&self, page: &PageRef, write: &PageWrite) -> Result<()> {
            self.calls.lock().unwrap().updates += 1;
            let mut pages = self.pages.lock().unwrap();
            let Some(stored) = pages.get_mut(&page.id) else {
                bail!("no such page {}", page.id);
            };
            for (name, value) in &write.fields {
                stored.fields.insert(name.clone(), value.clone());
            }
            stored.write = write.clone();
            Ok(())
        }
    }

    /// Catalog double backed by a fixed item list; records the size of
    /// every `fetch_items` call so chunking can be asserted.
    #[derive(Default)]
    pub struct MockCatalog {
        pub videos: Vec<RawVideo>,
        pub channels: BTreeMap<String, RawChannel>,
        pub categories: BTreeMap<String, String>,
        pub fail_fetches: AtomicBool,
        pub fetch_sizes: Mutex<Vec<usize>>,
    }

    impl MockCatalog {
        pub fn with_videos(videos: Vec<RawVideo>) -> Self {
            Self {
                videos,
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl Catalog for MockCatalog {
        async fn fetch_items(&self, ids: &[String]) -> Result<Vec<RawVideo>> {
            self.fetch_sizes.lock().unwrap().push(ids.len());
            if self.fail_fetches.load(Ordering::Relaxed) {
                bail!("catalog unavailable");
            }
            Ok(self
                .videos
                .iter()
                .filter(|v| ids.contains(&v.id))
                .cloned()
                .collect())
        }

        async fn fetch_channel(&self, channel_id: &str) -> Result<Option<RawChannel>> {
            Ok(self.channels.get(channel_id).cloned())
        }

        async fn fetch_category(&self, category_id: &str) -> Result<Option<String>> {
            Ok(self.categories.get(category_id).cloned())
        }
    }
}
