pub mod props;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde_json::{Map, Value};
use tracing::debug;

use crate::model::{FieldMap, PageRef, PageWrite};
use crate::sync::RecordStore;

const NOTION_VERSION: &str = "2022-06-28";

/// Notion API store client.
///
/// Endpoints used:
/// - POST /databases/{id}/query - exact-match lookup by one property
/// - POST /pages - create a page in a database
/// - PATCH /pages/{id} - update page properties / cover / icon
/// - GET /pages/{id} - read current property values
#[derive(Debug, Clone)]
pub struct NotionProvider {
    base_url: String,
    http: Client,
    api_key: String,
}

impl NotionProvider {
    pub fn new(api_key: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .user_agent("tubesync/0.1")
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            base_url: "https://api.notion.com/v1".to_string(),
            http,
            api_key: api_key.into(),
        })
    }

    /// Override the API base URL (tests, proxies).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .header("Notion-Version", NOTION_VERSION)
    }

    async fn send(&self, req: RequestBuilder, what: &str) -> Result<Value> {
        let resp = req
            .send()
            .await
            .with_context(|| format!("{what} request failed"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("{what} rejected with {status}: {body}"));
        }
        resp.json()
            .await
            .with_context(|| format!("{what} response did not parse"))
    }

    /// Assemble the body shared by page create and update calls.
    fn write_body(write: &PageWrite) -> Map<String, Value> {
        let mut body = Map::new();
        body.insert("properties".into(), props::to_properties(&write.fields));
        if let Some(url) = &write.icon_url {
            body.insert("icon".into(), props::external_file(url));
        }
        if let Some(url) = &write.cover_url {
            body.insert("cover".into(), props::external_file(url));
        }
        body
    }
}

#[async_trait]
impl RecordStore for NotionProvider {
    async fn find_page(
        &self,
        database_id: &str,
        property: &str,
        value: &str,
    ) -> Result<Option<PageRef>> {
        debug!(target: "notion", database_id, property, value, "query");
        let body = self
            .send(
                self.request(Method::POST, &format!("/databases/{database_id}/query"))
                    .json(&props::equals_filter(property, value)),
                "database query",
            )
            .await?;
        Ok(body
            .pointer("/results/0/id")
            .and_then(Value::as_str)
            .map(PageRef::new))
    }

    async fn page_fields(&self, page: &PageRef) -> Result<FieldMap> {
        let body = self
            .send(
                self.request(Method::GET, &format!("/pages/{}", page.id)),
                "page fetch",
            )
            .await?;
        Ok(props::fields_from_page(&body))
    }

    async fn create_page(&self, database_id: &str, write: &PageWrite) -> Result<PageRef> {
        let mut body = Self::write_body(write);
        body.insert(
            "parent".into(),
            serde_json::json!({ "database_id": database_id }),
        );
        let created = self
            .send(
                self.request(Method::POST, "/pages").json(&Value::Object(body)),
                "page create",
            )
            .await?;
        created
            .get("id")
            .and_then(Value::as_str)
            .map(PageRef::new)
            .ok_or_else(|| anyhow!("page create response carried no id"))
    }

    async fn update_page(&self, page: &PageRef, write: &PageWrite) -> Result<()> {
        let body = Self::write_body(write);
        self.send(
            self.request(Method::PATCH, &format!("/pages/{}", page.id))
                .json(&Value::Object(body)),
            "page update",
        )
        .await?;
        Ok(())
    }
}
