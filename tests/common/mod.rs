#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use tcg_console::config::{ApiConfig, ConsoleConfig};
use tcg_console::http::{ApiClient, Notifier};
use tcg_console::storage::{MemoryStorage, SharedStorage};
use tcg_console::Console;

pub const ACCESS_TOKEN: &str = "token-1";
pub const REFRESHED_TOKEN: &str = "token-2";
pub const REFRESH_TOKEN: &str = "refresh-1";
pub const PASSWORD: &str = "secret";

/// Request counters and captured inputs of the mock backend
#[derive(Default)]
pub struct MockState {
    pub menu_calls: AtomicUsize,
    pub permission_calls: AtomicUsize,
    pub logout_calls: AtomicUsize,
    pub list_queries: Mutex<Vec<String>>,
    pub uploads: Mutex<Vec<(String, usize)>>,
    pub default_set: Mutex<Vec<i64>>,
}

/// Envelope-speaking stand-in for the TestCase Generator backend
pub struct MockBackend {
    pub port: u16,
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock backend")?;

        let state = Arc::new(MockState::default());
        let app = app(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            port,
            base_url: format!("http://127.0.0.1:{}/api", port),
            state,
        })
    }

    pub fn config(&self) -> ConsoleConfig {
        let mut config = ConsoleConfig::from_env();
        config.api = ApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
        };
        config
    }

    pub fn client(&self, storage: SharedStorage, notifier: Arc<RecordingNotifier>) -> ApiClient {
        ApiClient::new(&self.config().api, storage, notifier).expect("client builds")
    }

    /// Console over in-memory storage; returns the notifier to inspect notices
    pub fn console(&self) -> (Console, Arc<RecordingNotifier>) {
        self.console_with(MemoryStorage::shared())
    }

    pub fn console_with(&self, storage: SharedStorage) -> (Console, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::default());
        let console = Console::new(&self.config(), storage, notifier.clone()).expect("console builds");
        (console, notifier)
    }
}

/// Collects user-facing notices instead of logging them
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<String> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(message.to_string());
        }
    }
}

fn ok(data: Value) -> Json<Value> {
    Json(json!({ "code": 0, "message": "success", "data": data }))
}

fn fail(code: i64, message: &str) -> Json<Value> {
    Json(json!({ "code": code, "message": message, "data": null }))
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, Json(json!({ "message": "token expired" }))).into_response()
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn authorized(headers: &HeaderMap) -> bool {
    matches!(bearer(headers).as_deref(), Some(ACCESS_TOKEN) | Some(REFRESHED_TOKEN))
}

fn user() -> Value {
    json!({
        "id": 1,
        "username": "alice",
        "email": "alice@example.com",
        "nickname": "Alice",
        "roles": ["admin"],
        "status": "active",
        "department": "QA"
    })
}

pub fn menu_tree() -> Value {
    json!([
        {
            "id": 100,
            "path": "/reports",
            "name": "Reports",
            "component": "Layout",
            "redirect": "/reports/daily",
            "type": "directory",
            "meta": { "title": "报表", "icon": "Document" },
            "children": [
                {
                    "id": 101,
                    "parentId": 100,
                    "path": "daily",
                    "name": "DailyReport",
                    "component": "DashboardView",
                    "type": "menu",
                    "meta": { "title": "日报", "keepAlive": true, "permission": "report:view" }
                },
                {
                    "id": 102,
                    "parentId": 100,
                    "path": "",
                    "name": "ReportExport",
                    "type": "button",
                    "meta": { "permission": "report:export" }
                }
            ]
        }
    ])
}

fn app(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/profile", get(profile))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/permission/user/menus", get(menus))
        .route("/api/permission/user/permissions", get(permissions))
        .route("/api/requirements", get(requirements))
        .route("/api/requirements/modules", get(requirement_modules))
        .route("/api/testcases/stats", get(testcase_stats))
        .route("/api/testcases/export", get(testcase_export))
        .route("/api/testcases/import", post(testcase_import))
        .route("/api/llm-configs", get(llm_configs))
        .route("/api/llm-configs/all", get(llm_configs_all))
        .route("/api/llm-configs/providers", get(broken))
        .route("/api/llm-configs/:id/default", put(llm_set_default))
        .route("/api/reviews/list", get(reviews))
        .route("/api/reviews/testcase/:id", get(testcase_reviews))
        .route("/api/expired", get(expired))
        .route("/api/business", get(business))
        .route("/api/broken", get(broken))
        .with_state(state)
}

async fn login(Json(body): Json<Value>) -> Json<Value> {
    if body.get("password").and_then(Value::as_str) != Some(PASSWORD) {
        return fail(1001, "账号或密码错误");
    }
    ok(json!({
        "accessToken": ACCESS_TOKEN,
        "refreshToken": REFRESH_TOKEN,
        "user": user(),
    }))
}

async fn logout(State(state): State<Arc<MockState>>) -> Json<Value> {
    state.logout_calls.fetch_add(1, Ordering::SeqCst);
    ok(Value::Null)
}

async fn profile(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    ok(user()).into_response()
}

async fn refresh(headers: HeaderMap) -> Response {
    if bearer(&headers).as_deref() != Some(REFRESH_TOKEN) {
        return unauthorized();
    }
    ok(json!({ "accessToken": REFRESHED_TOKEN })).into_response()
}

async fn menus(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.menu_calls.fetch_add(1, Ordering::SeqCst);
    ok(menu_tree()).into_response()
}

async fn permissions(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    state.permission_calls.fetch_add(1, Ordering::SeqCst);
    ok(json!(["report:view", "testcase:export"])).into_response()
}

async fn requirements(
    State(state): State<Arc<MockState>>,
    axum::extract::RawQuery(query): axum::extract::RawQuery,
) -> Json<Value> {
    if let Ok(mut queries) = state.list_queries.lock() {
        queries.push(query.unwrap_or_default());
    }
    ok(json!({
        "list": [{ "id": 1, "title": "Login flow" }, { "id": 2, "title": "Password reset" }],
        "total": 12
    }))
}

async fn requirement_modules() -> Json<Value> {
    ok(json!(["auth", "billing"]))
}

async fn testcase_stats() -> Json<Value> {
    ok(json!({ "total": 10, "passed": 6, "failed": 1, "pending": 3, "ai_generated": 4, "pass_rate": 60.0 }))
}

async fn testcase_export(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    (
        [
            (header::CONTENT_TYPE, "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"testcases.xlsx\""),
        ],
        vec![0x50u8, 0x4b, 0x03, 0x04],
    )
        .into_response()
}

async fn testcase_import(State(state): State<Arc<MockState>>, mut multipart: Multipart) -> Json<Value> {
    let mut imported = 0;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let size = field.bytes().await.map(|b| b.len()).unwrap_or(0);
        if let Ok(mut uploads) = state.uploads.lock() {
            uploads.push((name, size));
        }
        imported += 1;
    }
    ok(json!({ "imported": imported }))
}

async fn llm_configs() -> Json<Value> {
    ok(json!({
        "items": [{ "id": 1, "name": "deepseek" }, { "id": 2, "name": "qwen" }],
        "total": 2,
        "page": 1
    }))
}

async fn llm_configs_all(State(state): State<Arc<MockState>>) -> Json<Value> {
    let default_id = state
        .default_set
        .lock()
        .ok()
        .and_then(|ids| ids.last().copied())
        .unwrap_or(1);
    ok(json!([
        { "id": 1, "name": "deepseek", "is_default": default_id == 1 },
        { "id": 2, "name": "qwen", "is_default": default_id == 2 }
    ]))
}

async fn llm_set_default(State(state): State<Arc<MockState>>, Path(id): Path<i64>) -> Json<Value> {
    if let Ok(mut ids) = state.default_set.lock() {
        ids.push(id);
    }
    ok(json!({ "id": id, "is_default": true }))
}

async fn reviews() -> Json<Value> {
    ok(json!({ "list": [{ "id": 7, "status": "pending" }], "total": 1 }))
}

async fn testcase_reviews(Path(id): Path<i64>) -> Json<Value> {
    ok(json!({ "list": [{ "id": 7, "testcase_id": id }], "total": 1 }))
}

async fn expired() -> Response {
    unauthorized()
}

async fn business() -> Json<Value> {
    fail(4001, "需求不存在")
}

async fn broken() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "database down" }))).into_response()
}
