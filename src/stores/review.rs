use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ListField, ListPage, RecordId, REVIEWS};
use crate::error::ConsoleResult;
use crate::http::ApiClient;

use super::{logged, ResourceStore};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending: u64,
    #[serde(default)]
    pub approved: u64,
    #[serde(default)]
    pub rejected: u64,
    #[serde(default)]
    pub need_revision: u64,
    #[serde(default)]
    pub avg_rating: f64,
    #[serde(default)]
    pub approval_rate: f64,
}

/// Test case reviews, their comments and the review templates
pub struct ReviewStore {
    pub records: ResourceStore,
    stats: ReviewStats,
    templates: Vec<Value>,
    comments: Vec<Value>,
}

impl ReviewStore {
    pub fn new(client: ApiClient) -> Self {
        Self {
            records: ResourceStore::new(client, REVIEWS),
            stats: ReviewStats::default(),
            templates: Vec::new(),
            comments: Vec::new(),
        }
    }

    pub fn stats(&self) -> &ReviewStats {
        &self.stats
    }

    pub fn templates(&self) -> &[Value] {
        &self.templates
    }

    pub fn comments(&self) -> &[Value] {
        &self.comments
    }

    fn client(&self) -> &ApiClient {
        self.records.api().client()
    }

    fn path(&self, suffix: &str) -> String {
        self.records.api().path(suffix)
    }

    pub async fn fetch_testcase_reviews(&self, testcase_id: RecordId) -> ConsoleResult<Vec<Value>> {
        let result: ConsoleResult<Value> = self.client().get(&self.path(&format!("/testcase/{}", testcase_id))).await;
        let page: ListPage = logged(
            self.records.label(),
            "fetch test case reviews",
            result.and_then(|data| ListPage::from_data(data, ListField::List)),
        )?;
        Ok(page.items)
    }

    pub async fn batch_create(&self, body: &Value) -> ConsoleResult<Value> {
        logged(self.records.label(), "batch create", self.client().post(&self.path("/batch"), body).await)
    }

    pub async fn ai_review(&self, body: &Value) -> ConsoleResult<Value> {
        logged(self.records.label(), "ai review", self.client().post(&self.path("/ai-review"), body).await)
    }

    /// AI review without saving the result
    pub async fn ai_review_preview(&self, body: &Value) -> ConsoleResult<Value> {
        logged(self.records.label(), "ai review preview", self.client().post(&self.path("/ai-review-preview"), body).await)
    }

    pub async fn fetch_comments(&mut self, review_id: RecordId) -> ConsoleResult<Vec<Value>> {
        let result = self.client().get(&self.path(&format!("/{}/comments", review_id))).await;
        let comments: Vec<Value> = logged(self.records.label(), "fetch comments", result)?;
        self.comments = comments.clone();
        Ok(comments)
    }

    pub async fn add_comment(&self, review_id: RecordId, body: &Value) -> ConsoleResult<Value> {
        let result = self.client().post(&self.path(&format!("/{}/comments", review_id)), body).await;
        logged(self.records.label(), "add comment", result)
    }

    pub async fn delete_comment(&self, comment_id: RecordId) -> ConsoleResult<()> {
        let result = self.client().delete(&self.path(&format!("/comments/{}", comment_id))).await;
        logged(self.records.label(), "delete comment", result).map(|_| ())
    }

    pub async fn fetch_templates(&mut self) -> ConsoleResult<Vec<Value>> {
        let result = self.client().get(&self.path("/templates")).await;
        let templates: Vec<Value> = logged(self.records.label(), "fetch templates", result)?;
        self.templates = templates.clone();
        Ok(templates)
    }

    pub async fn fetch_template(&self, id: RecordId) -> ConsoleResult<Value> {
        let result = self.client().get(&self.path(&format!("/templates/{}", id))).await;
        logged(self.records.label(), "fetch template", result)
    }

    pub async fn create_template(&self, body: &Value) -> ConsoleResult<Value> {
        logged(self.records.label(), "create template", self.client().post(&self.path("/templates"), body).await)
    }

    pub async fn update_template(&self, id: RecordId, body: &Value) -> ConsoleResult<Value> {
        let result = self.client().put(&self.path(&format!("/templates/{}", id)), body).await;
        logged(self.records.label(), "update template", result)
    }

    pub async fn delete_template(&self, id: RecordId) -> ConsoleResult<()> {
        let result = self.client().delete(&self.path(&format!("/templates/{}", id))).await;
        logged(self.records.label(), "delete template", result).map(|_| ())
    }

    pub async fn fetch_stats(&mut self) -> ConsoleResult<ReviewStats> {
        let result = self.client().get(&self.path("/stats")).await;
        let stats: ReviewStats = logged(self.records.label(), "fetch stats", result)?;
        self.stats = stats.clone();
        Ok(stats)
    }
}
