use serde_json::Value;

use crate::api::{id_params, RecordId, PROMPTS};
use crate::error::ConsoleResult;
use crate::http::{ApiClient, Blob, Upload};

use super::{logged, ResourceStore};

pub struct PromptStore {
    pub records: ResourceStore,
    all: Vec<Value>,
}

impl PromptStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            records: ResourceStore::new(client, PROMPTS),
            all: Vec::new(),
        }
    }

    pub fn all(&self) -> &[Value] {
        &self.all
    }

    pub async fn fetch_all(&mut self) -> ConsoleResult<Vec<Value>> {
        let all = logged(self.records.label(), "fetch all", self.records.api().all().await)?;
        self.all = all.clone();
        Ok(all)
    }

    pub async fn set_default(&self, id: RecordId) -> ConsoleResult<Value> {
        let api = self.records.api();
        let result = api.client().put_empty(&api.path(&format!("/{}/default", id))).await;
        logged(self.records.label(), "set default", result)
    }

    /// `None` exports every prompt
    pub async fn export(&self, ids: Option<&[RecordId]>) -> ConsoleResult<Blob> {
        logged(self.records.label(), "export", self.records.api().export(&id_params(ids)).await)
    }

    pub async fn download_template(&self) -> ConsoleResult<Blob> {
        logged(self.records.label(), "download template", self.records.api().template().await)
    }

    pub async fn import(&self, upload: Upload) -> ConsoleResult<Value> {
        logged(self.records.label(), "import", self.records.api().import(upload).await)
    }
}
