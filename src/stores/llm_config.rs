use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::api::{RecordId, LLM_CONFIGS};
use crate::error::ConsoleResult;
use crate::http::{ApiClient, Params};

use super::{logged, ResourceStore};

#[derive(Debug, Clone, Serialize)]
struct ModelsRequest<'a> {
    api_base: &'a str,
    api_key: &'a str,
}

/// LLM provider configurations.
///
/// Every mutation re-fetches both the paged list and the unpaged list of
/// enabled configs so that `default_config` stays current.
pub struct LlmConfigStore {
    pub records: ResourceStore,
    all: Vec<Value>,
    providers: Map<String, Value>,
    available_models: Vec<Value>,
    models_loading: bool,
}

impl LlmConfigStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            records: ResourceStore::new(client, LLM_CONFIGS),
            all: Vec::new(),
            providers: Map::new(),
            available_models: Vec::new(),
            models_loading: false,
        }
    }

    pub fn all(&self) -> &[Value] {
        &self.all
    }

    pub fn providers(&self) -> &Map<String, Value> {
        &self.providers
    }

    pub fn available_models(&self) -> &[Value] {
        &self.available_models
    }

    pub fn models_loading(&self) -> bool {
        self.models_loading
    }

    /// First enabled config flagged `is_default`
    pub fn default_config(&self) -> Option<&Value> {
        self.all
            .iter()
            .find(|config| config.get("is_default").and_then(Value::as_bool).unwrap_or(false))
    }

    /// Errors degrade to an empty list
    pub async fn fetch_all(&mut self) -> Vec<Value> {
        match self.records.api().all().await {
            Ok(all) => {
                self.all = all.clone();
                all
            }
            Err(e) => {
                warn!(resource = %self.records.label(), "failed to fetch all configs: {}", e);
                Vec::new()
            }
        }
    }

    /// Errors degrade to an empty map
    pub async fn fetch_providers(&mut self) -> Map<String, Value> {
        let api = self.records.api();
        let result: ConsoleResult<Map<String, Value>> = api.client().get(&api.path("/providers")).await;
        match result {
            Ok(providers) => {
                self.providers = providers.clone();
                providers
            }
            Err(e) => {
                warn!(resource = %self.records.label(), "failed to fetch providers: {}", e);
                Map::new()
            }
        }
    }

    pub async fn create(&mut self, body: &Value) -> ConsoleResult<Value> {
        let created = self.records.create(body).await?;
        self.reload().await?;
        Ok(created)
    }

    pub async fn update(&mut self, id: RecordId, body: &Value) -> ConsoleResult<Value> {
        let updated = self.records.update(id, body).await?;
        self.reload().await?;
        Ok(updated)
    }

    pub async fn delete(&mut self, id: RecordId) -> ConsoleResult<()> {
        self.records.delete(id).await?;
        self.reload().await
    }

    pub async fn set_default(&mut self, id: RecordId) -> ConsoleResult<Value> {
        let api = self.records.api();
        let result = api.client().put_empty(&api.path(&format!("/{}/default", id))).await;
        let config = logged(self.records.label(), "set default", result)?;
        self.reload().await?;
        Ok(config)
    }

    /// Ask the provider behind `api_base` which models it serves.
    ///
    /// The previous model list is cleared before the call.
    pub async fn fetch_available_models(&mut self, api_base: &str, api_key: &str) -> ConsoleResult<Vec<Value>> {
        self.models_loading = true;
        self.available_models.clear();

        let api = self.records.api();
        let request = ModelsRequest { api_base, api_key };
        let result = api.client().post(&api.path("/models"), &request).await;
        self.models_loading = false;

        let models: Vec<Value> = logged(self.records.label(), "fetch models", result)?;
        self.available_models = models.clone();
        Ok(models)
    }

    pub async fn test_config(&self, body: &Value) -> ConsoleResult<Value> {
        let api = self.records.api();
        logged(self.records.label(), "test config", api.client().post(&api.path("/test"), body).await)
    }

    async fn reload(&mut self) -> ConsoleResult<()> {
        self.records.fetch_list(&Params::new()).await?;
        self.fetch_all().await;
        Ok(())
    }
}
