use serde_json::Value;

use crate::api::{id_params, RecordId, KNOWLEDGE};
use crate::error::ConsoleResult;
use crate::http::{ApiClient, Blob, Upload};

use super::{logged, ResourceStore};

pub struct KnowledgeStore {
    pub records: ResourceStore,
    all: Vec<Value>,
}

impl KnowledgeStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            records: ResourceStore::new(client, KNOWLEDGE),
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

    /// Several entries in one call, e.g. for the knowledge picker
    pub async fn fetch_batch(&self, ids: &[RecordId]) -> ConsoleResult<Vec<Value>> {
        let api = self.records.api();
        let result = api.client().get_with(&api.path("/batch"), &id_params(Some(ids))).await;
        logged(self.records.label(), "fetch batch", result)
    }

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
