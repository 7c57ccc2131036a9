//! Auth tokens and the signed-in user's profile.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::api::auth::{
    AuthApi, ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, ResetPasswordRequest,
    UserProfile,
};
use crate::error::{ConsoleError, ConsoleResult};
use crate::storage::{
    self, SharedStorage, ACCESS_TOKEN_KEY, LOGIN_AT_KEY, REFRESH_TOKEN_KEY, USER_INFO_KEY, USER_NAME_KEY,
};

pub struct SessionStore {
    storage: SharedStorage,
    api: AuthApi,
    token: String,
    refresh_token: String,
    user_profile: Option<UserProfile>,
    login_at: Option<DateTime<Utc>>,
}

impl SessionStore {
    /// Restore whatever the previous run persisted
    pub fn load(storage: SharedStorage, api: AuthApi) -> Self {
        let token = storage.get(ACCESS_TOKEN_KEY).unwrap_or_default();
        let refresh_token = storage.get(REFRESH_TOKEN_KEY).unwrap_or_default();
        let user_profile = storage::get_json(storage.as_ref(), USER_INFO_KEY).unwrap_or_else(|e| {
            tracing::warn!("discarding cached user profile: {}", e);
            None
        });
        let login_at = storage::get_json(storage.as_ref(), LOGIN_AT_KEY).unwrap_or(None);

        Self {
            storage,
            api,
            token,
            refresh_token,
            user_profile,
            login_at,
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn user_profile(&self) -> Option<&UserProfile> {
        self.user_profile.as_ref()
    }

    pub fn login_at(&self) -> Option<DateTime<Utc>> {
        self.login_at
    }

    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }

    /// Token presence in storage; the HTTP client may have cleared it behind
    /// this store's back after a 401
    pub fn has_stored_token(&self) -> bool {
        self.storage
            .get(ACCESS_TOKEN_KEY)
            .is_some_and(|t| !t.is_empty())
    }

    pub fn has_role(&self, role: &str) -> bool {
        role.is_empty() || self.roles().iter().any(|r| r == role)
    }

    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.is_empty() || roles.iter().any(|r| self.has_role(r))
    }

    pub fn has_all_roles(&self, roles: &[&str]) -> bool {
        roles.iter().all(|r| self.has_role(r))
    }

    fn roles(&self) -> &[String] {
        self.user_profile.as_ref().map(|p| p.roles.as_slice()).unwrap_or(&[])
    }

    pub async fn login(&mut self, request: &LoginRequest) -> ConsoleResult<&UserProfile> {
        let LoginResponse {
            access_token,
            refresh_token,
            user,
        } = self.api.login(request).await?;

        let now = Utc::now();
        self.storage.set(ACCESS_TOKEN_KEY, &access_token)?;
        self.storage.set(REFRESH_TOKEN_KEY, &refresh_token)?;
        storage::set_json(self.storage.as_ref(), USER_INFO_KEY, &user)?;
        self.storage.set(USER_NAME_KEY, user.display_name())?;
        storage::set_json(self.storage.as_ref(), LOGIN_AT_KEY, &now)?;

        tracing::info!(user = %user.username, "logged in");

        self.token = access_token;
        self.refresh_token = refresh_token;
        self.login_at = Some(now);
        Ok(self.user_profile.insert(user))
    }

    pub async fn register(&self, request: &RegisterRequest) -> ConsoleResult<Value> {
        self.api.register(request).await
    }

    /// Server-side logout is best effort; local state is always cleared
    pub async fn logout(&mut self) -> ConsoleResult<()> {
        if let Err(e) = self.api.logout().await {
            tracing::debug!("ignoring logout failure: {}", e);
        }
        self.clear_auth()
    }

    pub fn clear_auth(&mut self) -> ConsoleResult<()> {
        self.token.clear();
        self.refresh_token.clear();
        self.user_profile = None;
        self.login_at = None;
        storage::remove_all(
            self.storage.as_ref(),
            &[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USER_INFO_KEY, USER_NAME_KEY, LOGIN_AT_KEY],
        )?;
        Ok(())
    }

    /// Reload the profile; any failure ends the session
    pub async fn fetch_profile(&mut self) -> ConsoleResult<&UserProfile> {
        match self.api.profile().await {
            Ok(profile) => {
                storage::set_json(self.storage.as_ref(), USER_INFO_KEY, &profile)?;
                self.storage.set(USER_NAME_KEY, profile.display_name())?;
                Ok(self.user_profile.insert(profile))
            }
            Err(e) => {
                if let Err(clear_err) = self.clear_auth() {
                    tracing::error!("failed to clear session: {}", clear_err);
                }
                Err(e)
            }
        }
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh(&mut self) -> ConsoleResult<()> {
        if self.refresh_token.is_empty() {
            return Err(ConsoleError::NotAuthenticated);
        }
        let response = self.api.refresh(&self.refresh_token).await?;
        self.storage.set(ACCESS_TOKEN_KEY, &response.access_token)?;
        self.token = response.access_token;
        tracing::info!("access token refreshed");
        Ok(())
    }

    pub async fn change_password(&self, request: &ChangePasswordRequest) -> ConsoleResult<Value> {
        self.api.change_password(request).await
    }

    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> ConsoleResult<Value> {
        self.api.reset_password(request).await
    }
}
