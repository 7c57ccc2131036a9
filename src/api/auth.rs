use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ConsoleResult;
use crate::http::ApiClient;
use crate::menu::MenuNode;
use crate::permission::PermissionSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Username or email
    pub account: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub email: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.username)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

/// `/auth/*` and the per-user `/permission/user/*` endpoints
#[derive(Clone)]
pub struct AuthApi {
    client: ApiClient,
}

impl AuthApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn login(&self, request: &LoginRequest) -> ConsoleResult<LoginResponse> {
        self.client.post("/auth/login", request).await
    }

    pub async fn register(&self, request: &RegisterRequest) -> ConsoleResult<Value> {
        self.client.post("/auth/register", request).await
    }

    pub async fn logout(&self) -> ConsoleResult<Value> {
        self.client.post_empty("/auth/logout").await
    }

    pub async fn profile(&self) -> ConsoleResult<UserProfile> {
        self.client.get("/auth/profile").await
    }

    pub async fn update_profile(&self, changes: &Value) -> ConsoleResult<UserProfile> {
        self.client.put("/auth/profile", changes).await
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> ConsoleResult<Value> {
        self.client.post("/auth/change-password", request).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> ConsoleResult<Value> {
        self.client.post("/auth/reset-password", request).await
    }

    /// The refresh endpoint authenticates with the refresh token, not the access token
    pub async fn refresh(&self, refresh_token: &str) -> ConsoleResult<RefreshResponse> {
        self.client.post_with_bearer("/auth/refresh", refresh_token).await
    }

    pub async fn user_menus(&self) -> ConsoleResult<Vec<MenuNode>> {
        self.client.get("/permission/user/menus").await
    }

    pub async fn user_permissions(&self) -> ConsoleResult<Vec<String>> {
        self.client.get("/permission/user/permissions").await
    }
}

#[async_trait]
impl PermissionSource for AuthApi {
    async fn fetch_menus(&self) -> ConsoleResult<Vec<MenuNode>> {
        self.user_menus().await
    }

    async fn fetch_permission_codes(&self) -> ConsoleResult<Vec<String>> {
        self.user_permissions().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn login_response_uses_camel_case() {
        let response: LoginResponse = serde_json::from_value(json!({
            "accessToken": "a",
            "refreshToken": "r",
            "user": {"id": 1, "username": "admin", "nickname": "管理员", "roles": ["admin"], "last_login": null}
        }))
        .unwrap();
        assert_eq!(response.access_token, "a");
        assert_eq!(response.user.display_name(), "管理员");
        assert!(response.user.extra.contains_key("last_login"));
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let profile: UserProfile = serde_json::from_value(json!({"id": 2, "username": "qa", "nickname": ""})).unwrap();
        assert_eq!(profile.display_name(), "qa");
    }

    #[test]
    fn change_password_serializes_backend_fields() {
        let body = serde_json::to_value(ChangePasswordRequest {
            old_password: "a".into(),
            new_password: "b".into(),
            confirm_password: "b".into(),
        })
        .unwrap();
        assert_eq!(body, json!({"oldPassword": "a", "newPassword": "b", "confirmPassword": "b"}));
    }
}
