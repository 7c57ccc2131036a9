//! Resource stores: cached list/detail state over the REST endpoints.
//!
//! Stores never mutate cached lists after create/update/delete; callers
//! re-fetch. Overlapping fetches are not sequenced, so the last response to
//! arrive wins.

pub mod knowledge;
pub mod llm_config;
pub mod prompt;
pub mod requirement;
pub mod review;
pub mod testcase;

use serde_json::Value;

use crate::api::{ListPage, RecordId, Resource, ResourceApi};
use crate::error::ConsoleResult;
use crate::http::{ApiClient, Params};

pub use knowledge::KnowledgeStore;
pub use llm_config::LlmConfigStore;
pub use prompt::PromptStore;
pub use requirement::RequirementStore;
pub use review::ReviewStore;
pub use testcase::TestCaseStore;

/// Log a failed store call and hand the error back
pub(crate) fn logged<T>(label: &str, action: &str, result: ConsoleResult<T>) -> ConsoleResult<T> {
    if let Err(e) = &result {
        tracing::error!(resource = %label, "failed to {}: {}", action, e);
    }
    result
}

/// List/detail cache shared by every resource family
pub struct ResourceStore {
    api: ResourceApi,
    items: Vec<Value>,
    total: u64,
    loading: bool,
    current: Option<Value>,
}

impl ResourceStore {
    pub fn new(client: ApiClient, resource: Resource) -> Self {
        Self {
            api: ResourceApi::new(client, resource),
            items: Vec::new(),
            total: 0,
            loading: false,
            current: None,
        }
    }

    pub fn api(&self) -> &ResourceApi {
        &self.api
    }

    pub fn label(&self) -> &'static str {
        self.api.resource().label
    }

    pub fn items(&self) -> &[Value] {
        &self.items
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn current(&self) -> Option<&Value> {
        self.current.as_ref()
    }

    /// Items and total are replaced together, only on success
    pub async fn fetch_list(&mut self, params: &Params) -> ConsoleResult<ListPage> {
        self.loading = true;
        let result = self.api.list(params).await;
        self.loading = false;

        let page = logged(self.label(), "fetch list", result)?;
        self.items = page.items.clone();
        self.total = page.total;
        Ok(page)
    }

    pub async fn fetch_one(&mut self, id: RecordId) -> ConsoleResult<Value> {
        let item = logged(self.label(), "fetch detail", self.api.detail(id).await)?;
        self.current = Some(item.clone());
        Ok(item)
    }

    pub async fn create(&self, body: &Value) -> ConsoleResult<Value> {
        logged(self.label(), "create", self.api.create(body).await)
    }

    pub async fn update(&self, id: RecordId, body: &Value) -> ConsoleResult<Value> {
        logged(self.label(), "update", self.api.update(id, body).await)
    }

    pub async fn delete(&self, id: RecordId) -> ConsoleResult<()> {
        logged(self.label(), "delete", self.api.delete(id).await)
    }
}
