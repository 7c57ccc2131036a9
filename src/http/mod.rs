//! REST client for the TestCase Generator backend.
//!
//! Every call goes through the same two interceptors: the request side
//! attaches `Authorization: Bearer <accessToken>` when a token is stored, the
//! response side unwraps `{code, message, data}` envelopes, passes binary
//! downloads through untouched and turns failures into [`ConsoleError`]s after
//! surfacing a notice.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::storage::{self, SharedStorage, ACCESS_TOKEN_KEY, SESSION_KEYS};

pub const SESSION_EXPIRED_NOTICE: &str = "Session expired, please log in again";
pub const NETWORK_ERROR_NOTICE: &str = "Network error";
pub const REQUEST_FAILED_NOTICE: &str = "Request failed";

/// Query parameters for list and export endpoints
pub type Params = BTreeMap<String, String>;

/// User-visible transient notices (the toast of a browser UI)
pub trait Notifier: Send + Sync {
    fn error(&self, message: &str);
}

/// Default notifier: notices become log lines
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::warn!(notice = %message, "user notice");
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Value,
}

/// Raw bytes from an export or template endpoint
#[derive(Debug, Clone)]
pub struct Blob {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub filename: Option<String>,
}

/// A single file for multipart import endpoints, sent as the `file` field
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub mime: Option<String>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
            mime: None,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }
}

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    storage: SharedStorage,
    notifier: Arc<dyn Notifier>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig, storage: SharedStorage, notifier: Arc<dyn Notifier>) -> ConsoleResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            storage,
            notifier,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ConsoleResult<T> {
        let request = self.request(Method::GET, path, None);
        decode(self.send_envelope(request).await?)
    }

    pub async fn get_with<T: DeserializeOwned, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> ConsoleResult<T> {
        let request = self.request(Method::GET, path, None).query(query);
        decode(self.send_envelope(request).await?)
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ConsoleResult<T> {
        let request = self.request(Method::POST, path, None).json(body);
        decode(self.send_envelope(request).await?)
    }

    /// POST without a body
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> ConsoleResult<T> {
        let request = self.request(Method::POST, path, None);
        decode(self.send_envelope(request).await?)
    }

    /// POST authenticated with an explicit bearer instead of the stored access token
    pub async fn post_with_bearer<T: DeserializeOwned>(&self, path: &str, token: &str) -> ConsoleResult<T> {
        let request = self.request(Method::POST, path, Some(token));
        decode(self.send_envelope(request).await?)
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ConsoleResult<T> {
        let request = self.request(Method::PUT, path, None).json(body);
        decode(self.send_envelope(request).await?)
    }

    pub async fn put_empty<T: DeserializeOwned>(&self, path: &str) -> ConsoleResult<T> {
        let request = self.request(Method::PUT, path, None);
        decode(self.send_envelope(request).await?)
    }

    pub async fn delete(&self, path: &str) -> ConsoleResult<Value> {
        let request = self.request(Method::DELETE, path, None);
        self.send_envelope(request).await
    }

    /// Binary download; bypasses envelope handling entirely
    pub async fn get_blob<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ConsoleResult<Blob> {
        let request = self.request(Method::GET, path, None).query(query);
        let response = self.send(request).await?;

        let content_type = header_string(&response, CONTENT_TYPE.as_str());
        let filename = header_string(&response, CONTENT_DISPOSITION.as_str())
            .and_then(|value| disposition_filename(&value));
        let bytes = response.bytes().await.map_err(|e| self.transport_failure(e))?;

        Ok(Blob {
            bytes: bytes.to_vec(),
            content_type,
            filename,
        })
    }

    /// Multipart upload with the file under the `file` field
    pub async fn upload<T: DeserializeOwned>(&self, path: &str, upload: Upload) -> ConsoleResult<T> {
        let mut part = reqwest::multipart::Part::bytes(upload.bytes).file_name(upload.file_name);
        if let Some(mime) = upload.mime.as_deref() {
            part = part
                .mime_str(mime)
                .map_err(|e| ConsoleError::Transport(e.to_string()))?;
        }
        let form = reqwest::multipart::Form::new().part("file", part);

        let request = self.request(Method::POST, path, None).multipart(form);
        decode(self.send_envelope(request).await?)
    }

    fn request(&self, method: Method, path: &str, bearer: Option<&str>) -> RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let request_id = Uuid::new_v4();
        tracing::debug!(%request_id, %method, %url, "api request");

        let mut builder = self.http.request(method, url).header("X-Request-Id", request_id.to_string());

        let token = match bearer {
            Some(token) => Some(token.to_string()),
            None => self.storage.get(ACCESS_TOKEN_KEY),
        };
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder
    }

    async fn send(&self, request: RequestBuilder) -> ConsoleResult<Response> {
        let response = request.send().await.map_err(|e| self.transport_failure(e))?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            self.expire_session();
            return Err(ConsoleError::SessionExpired);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = server_message(&body)
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| NETWORK_ERROR_NOTICE.to_string());
            self.notifier.error(&message);
            return Err(ConsoleError::http(status.as_u16(), message));
        }

        Ok(response)
    }

    async fn send_envelope(&self, request: RequestBuilder) -> ConsoleResult<Value> {
        let response = self.send(request).await?;
        let body = response.bytes().await.map_err(|e| self.transport_failure(e))?;

        let envelope: Envelope = serde_json::from_slice(&body).map_err(|e| {
            self.notifier.error(REQUEST_FAILED_NOTICE);
            ConsoleError::Decode(e.to_string())
        })?;

        if envelope.code != 0 {
            let message = envelope
                .message
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| REQUEST_FAILED_NOTICE.to_string());
            self.notifier.error(&message);
            return Err(ConsoleError::business(envelope.code, message));
        }

        Ok(envelope.data)
    }

    fn transport_failure(&self, err: reqwest::Error) -> ConsoleError {
        let message = err.to_string();
        if message.is_empty() {
            self.notifier.error(NETWORK_ERROR_NOTICE);
        } else {
            self.notifier.error(&message);
        }
        ConsoleError::from(err)
    }

    fn expire_session(&self) {
        if let Err(e) = storage::remove_all(self.storage.as_ref(), SESSION_KEYS) {
            tracing::error!("failed to clear session storage: {}", e);
        }
        tracing::info!("backend rejected session, credentials cleared");
        self.notifier.error(SESSION_EXPIRED_NOTICE);
    }
}

fn decode<T: DeserializeOwned>(data: Value) -> ConsoleResult<T> {
    serde_json::from_value(data).map_err(ConsoleError::from)
}

fn header_string(response: &Response, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

fn server_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

/// Pull `filename` out of a `Content-Disposition` header
fn disposition_filename(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
            .filter(|name| !name.is_empty())
    })
}
