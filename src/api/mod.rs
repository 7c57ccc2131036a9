//! Endpoint tables for the backend's resource families.

pub mod auth;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ConsoleError, ConsoleResult};
use crate::http::{ApiClient, Blob, Params, Upload};

pub use auth::{AuthApi, LoginRequest, LoginResponse, RegisterRequest, UserProfile};

pub type RecordId = i64;

/// Field carrying the rows of a paged list response.
///
/// Two conventions coexist on the backend and are kept per endpoint rather
/// than unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListField {
    List,
    Items,
}

impl ListField {
    pub fn key(self) -> &'static str {
        match self {
            ListField::List => "list",
            ListField::Items => "items",
        }
    }
}

/// One page of a list endpoint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListPage<T = Value> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T: DeserializeOwned> ListPage<T> {
    pub fn from_data(data: Value, field: ListField) -> ConsoleResult<Self> {
        let Value::Object(mut object) = data else {
            return Err(ConsoleError::Decode("list response is not an object".to_string()));
        };

        let rows = object
            .remove(field.key())
            .ok_or_else(|| ConsoleError::Decode(format!("list response has no '{}' field", field.key())))?;
        let items: Vec<T> = serde_json::from_value(rows)?;
        let total = match object.get("total").and_then(Value::as_u64) {
            Some(total) => total,
            None => items.len() as u64,
        };

        Ok(Self { items, total })
    }
}

/// Describes one REST resource family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resource {
    pub label: &'static str,
    pub base: &'static str,
    pub list_path: &'static str,
    pub list_field: ListField,
}

pub const REQUIREMENTS: Resource = Resource {
    label: "requirement",
    base: "/requirements",
    list_path: "/requirements",
    list_field: ListField::List,
};

pub const TESTCASES: Resource = Resource {
    label: "testcase",
    base: "/testcases",
    list_path: "/testcases",
    list_field: ListField::List,
};

pub const PROMPTS: Resource = Resource {
    label: "prompt",
    base: "/prompts",
    list_path: "/prompts",
    list_field: ListField::List,
};

pub const KNOWLEDGE: Resource = Resource {
    label: "knowledge",
    base: "/knowledges",
    list_path: "/knowledges",
    list_field: ListField::List,
};

pub const LLM_CONFIGS: Resource = Resource {
    label: "llm-config",
    base: "/llm-configs",
    list_path: "/llm-configs",
    list_field: ListField::Items,
};

pub const REVIEWS: Resource = Resource {
    label: "review",
    base: "/reviews",
    list_path: "/reviews/list",
    list_field: ListField::List,
};

/// CRUD calls shared by every resource family
#[derive(Clone)]
pub struct ResourceApi {
    client: ApiClient,
    resource: Resource,
}

impl ResourceApi {
    pub fn new(client: ApiClient, resource: Resource) -> Self {
        Self { client, resource }
    }

    pub fn resource(&self) -> Resource {
        self.resource
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// `base` + `suffix`, e.g. `path("/stats")` → `/testcases/stats`
    pub fn path(&self, suffix: &str) -> String {
        format!("{}{}", self.resource.base, suffix)
    }

    pub async fn list(&self, params: &Params) -> ConsoleResult<ListPage> {
        let data: Value = self.client.get_with(self.resource.list_path, params).await?;
        ListPage::from_data(data, self.resource.list_field)
    }

    pub async fn detail(&self, id: RecordId) -> ConsoleResult<Value> {
        self.client.get(&self.path(&format!("/{}", id))).await
    }

    pub async fn create(&self, body: &Value) -> ConsoleResult<Value> {
        self.client.post(self.resource.base, body).await
    }

    pub async fn update(&self, id: RecordId, body: &Value) -> ConsoleResult<Value> {
        self.client.put(&self.path(&format!("/{}", id)), body).await
    }

    pub async fn delete(&self, id: RecordId) -> ConsoleResult<()> {
        self.client.delete(&self.path(&format!("/{}", id))).await?;
        Ok(())
    }

    /// `GET {base}/all` - the unpaged list of enabled rows
    pub async fn all(&self) -> ConsoleResult<Vec<Value>> {
        self.client.get(&self.path("/all")).await
    }

    pub async fn export(&self, params: &Params) -> ConsoleResult<Blob> {
        self.client.get_blob(&self.path("/export"), params).await
    }

    pub async fn template(&self) -> ConsoleResult<Blob> {
        self.client.get_blob(&self.path("/template"), &Params::new()).await
    }

    pub async fn import(&self, upload: Upload) -> ConsoleResult<Value> {
        self.client.upload(&self.path("/import"), upload).await
    }
}

/// `ids=1,2,3` for the export and batch endpoints; `None` exports everything
pub fn id_params(ids: Option<&[RecordId]>) -> Params {
    let mut params = Params::new();
    if let Some(ids) = ids {
        let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        params.insert("ids".to_string(), joined);
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_page_reads_list_convention() {
        let page: ListPage = ListPage::from_data(json!({"list": [{"id": 1}, {"id": 2}], "total": 9}), ListField::List).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total, 9);
    }

    #[test]
    fn list_page_reads_items_convention() {
        let page: ListPage = ListPage::from_data(json!({"items": [{"id": 1}], "total": 1, "page": 1}), ListField::Items).unwrap();
        assert_eq!(page.items, vec![json!({"id": 1})]);
    }

    #[test]
    fn wrong_convention_is_a_decode_error() {
        let err = ListPage::<Value>::from_data(json!({"items": [], "total": 0}), ListField::List).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_RESPONSE");
    }

    #[test]
    fn id_params_join_with_commas() {
        assert_eq!(id_params(Some(&[1, 2, 3])).get("ids").map(String::as_str), Some("1,2,3"));
        assert!(id_params(None).is_empty());
    }
}
