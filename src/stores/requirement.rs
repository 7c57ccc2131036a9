use serde_json::Value;

use crate::api::REQUIREMENTS;
use crate::error::ConsoleResult;
use crate::http::ApiClient;

use super::{logged, ResourceStore};

pub struct RequirementStore {
    pub records: ResourceStore,
    modules: Vec<Value>,
}

impl RequirementStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            records: ResourceStore::new(client, REQUIREMENTS),
            modules: Vec::new(),
        }
    }

    pub fn modules(&self) -> &[Value] {
        &self.modules
    }

    /// Distinct module names used by requirements
    pub async fn fetch_modules(&mut self) -> ConsoleResult<Vec<Value>> {
        let api = self.records.api();
        let result = api.client().get(&api.path("/modules")).await;
        let modules: Vec<Value> = logged(self.records.label(), "fetch modules", result)?;
        self.modules = modules.clone();
        Ok(modules)
    }
}
