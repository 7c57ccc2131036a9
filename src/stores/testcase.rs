use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::TESTCASES;
use crate::error::ConsoleResult;
use crate::http::{ApiClient, Blob, Params, Upload};

use super::{logged, ResourceStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCaseStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub passed: u64,
    #[serde(default)]
    pub failed: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub blocked: u64,
    #[serde(default)]
    pub ai_generated: u64,
    #[serde(default)]
    pub pass_rate: f64,
}

pub struct TestCaseStore {
    pub records: ResourceStore,
    stats: TestCaseStats,
}

impl TestCaseStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            records: ResourceStore::new(client, TESTCASES),
            stats: TestCaseStats::default(),
        }
    }

    pub fn stats(&self) -> &TestCaseStats {
        &self.stats
    }

    pub async fn create_batch(&self, body: &Value) -> ConsoleResult<Value> {
        let api = self.records.api();
        logged(api.resource().label, "create batch", api.client().post(&api.path("/batch"), body).await)
    }

    pub async fn fetch_stats(&mut self) -> ConsoleResult<TestCaseStats> {
        let api = self.records.api();
        let result = api.client().get(&api.path("/stats")).await;
        let stats: TestCaseStats = logged(api.resource().label, "fetch stats", result)?;
        self.stats = stats.clone();
        Ok(stats)
    }

    /// AI generation; the backend persists the generated cases
    pub async fn generate(&self, body: &Value) -> ConsoleResult<Value> {
        let client = self.records.api().client();
        logged(self.records.label(), "generate test cases", client.post("/ai/generate", body).await)
    }

    /// AI generation without persisting
    pub async fn preview(&self, body: &Value) -> ConsoleResult<Value> {
        let client = self.records.api().client();
        logged(self.records.label(), "preview test cases", client.post("/ai/preview", body).await)
    }

    pub async fn export(&self, params: &Params) -> ConsoleResult<Blob> {
        logged(self.records.label(), "export", self.records.api().export(params).await)
    }

    pub async fn download_template(&self) -> ConsoleResult<Blob> {
        logged(self.records.label(), "download template", self.records.api().template().await)
    }

    pub async fn import(&self, upload: Upload) -> ConsoleResult<Value> {
        logged(self.records.label(), "import", self.records.api().import(upload).await)
    }
}
