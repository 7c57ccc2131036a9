//! The console context: owns storage, the HTTP client, the session and
//! permission stores and the router, and drives navigation through the guard.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::auth::{AuthApi, LoginRequest, UserProfile};
use crate::config::ConsoleConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::http::{ApiClient, Notifier, TracingNotifier};
use crate::permission::PermissionStore;
use crate::router::{
    document_title, materialize_routes, reset_routes, GuardOutcome, Location, NavigationGuard, ResolvedRoute,
    Router, RouterError, HOME_PATH, LOGIN_PATH,
};
use crate::router::guard::MaterializeReport;
use crate::session::SessionStore;
use crate::storage::{FileStorage, MemoryStorage, SharedStorage};
use crate::stores::{KnowledgeStore, LlmConfigStore, PromptStore, RequirementStore, ReviewStore, TestCaseStore};

/// Guard redirects plus route-level redirects allowed in one navigation
const MAX_NAVIGATION_HOPS: usize = 8;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("Too many redirects while navigating to '{0}'")]
    TooManyRedirects(String),

    #[error(transparent)]
    Router(#[from] RouterError),
}

/// A committed navigation
#[derive(Debug, Clone, Serialize)]
pub struct Navigation {
    pub location: Location,
    pub route: ResolvedRoute,
    pub title: String,
    pub replaced: bool,
    /// Every location abandoned on the way, in order
    pub redirects: Vec<String>,
}

pub struct Console {
    storage: SharedStorage,
    client: ApiClient,
    auth: AuthApi,
    pub session: SessionStore,
    pub permissions: PermissionStore,
    pub router: Router,
    guard: NavigationGuard,
}

impl Console {
    /// A fresh console starts cold: the first guarded navigation refreshes
    /// permissions and materializes routes even if a snapshot was persisted.
    pub fn new(config: &ConsoleConfig, storage: SharedStorage, notifier: Arc<dyn Notifier>) -> ConsoleResult<Self> {
        let client = ApiClient::new(&config.api, storage.clone(), notifier)?;
        let auth = AuthApi::new(client.clone());
        let session = SessionStore::load(storage.clone(), auth.clone());
        let permissions = PermissionStore::load(storage.clone());

        Ok(Self {
            storage,
            client,
            auth,
            session,
            permissions,
            router: Router::new(),
            guard: NavigationGuard::new(true),
        })
    }

    /// File-backed storage when a directory is configured, memory otherwise
    pub fn from_config(config: &ConsoleConfig) -> ConsoleResult<Self> {
        let storage: SharedStorage = match config.storage_dir() {
            Some(dir) => Arc::new(FileStorage::open(dir)?),
            None => {
                warn!("no storage directory available, session will not persist");
                MemoryStorage::shared()
            }
        };
        Self::new(config, storage, Arc::new(TracingNotifier))
    }

    pub fn storage(&self) -> &SharedStorage {
        &self.storage
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn auth(&self) -> &AuthApi {
        &self.auth
    }

    pub fn is_cold_start(&self) -> bool {
        self.guard.is_cold_start()
    }

    /// Run `target` through the guard and commit the final location.
    ///
    /// Guard redirects start a new attempt; a re-dispatch after route
    /// materialization retries the same target and replaces the history entry.
    pub async fn navigate(&mut self, target: &str) -> Result<Navigation, NavigationError> {
        let mut location = Location::parse(target);
        let mut replaced = false;
        let mut redirects = Vec::new();

        for _ in 0..MAX_NAVIGATION_HOPS {
            let authenticated = self.session.has_stored_token();
            let outcome = self
                .guard
                .before_each(&location, authenticated, &mut self.permissions, &mut self.router, &self.auth)
                .await;

            match outcome {
                GuardOutcome::Redirect(next) => {
                    redirects.push(location.full_path());
                    location = next;
                }
                GuardOutcome::Redispatch(next) => {
                    location = next;
                    replaced = true;
                }
                GuardOutcome::Proceed => {
                    let route = self.router.resolve(&location.path)?;

                    // route-level redirect: the new path is guarded on its own
                    if route.path != location.path {
                        redirects.push(location.full_path());
                        location = Location::new(route.path);
                        continue;
                    }

                    return Ok(self.commit(location, route, replaced, redirects));
                }
            }
        }

        Err(NavigationError::TooManyRedirects(target.to_string()))
    }

    fn commit(&mut self, location: Location, route: ResolvedRoute, replaced: bool, redirects: Vec<String>) -> Navigation {
        let title = document_title(&route.meta);
        if replaced {
            self.router.replace(location.clone());
        } else {
            self.router.push(location.clone());
        }
        info!(to = %location, route = %route.name, %title, "navigated");

        Navigation {
            location,
            route,
            title,
            replaced,
            redirects,
        }
    }

    /// Materialize routes outside of a navigation, e.g. to inspect them
    pub async fn materialize(&mut self) -> MaterializeReport {
        materialize_routes(&mut self.permissions, &mut self.router, &self.auth).await
    }

    pub async fn login(&mut self, request: &LoginRequest) -> ConsoleResult<UserProfile> {
        self.session.login(request).await.cloned()
    }

    /// After login, go where the login page was asked to return to
    pub async fn return_from_login(&mut self) -> Result<Navigation, NavigationError> {
        let target = self
            .router
            .current()
            .and_then(Location::redirect_target)
            .unwrap_or_else(|| Location::new(HOME_PATH));
        self.navigate(&target.full_path()).await
    }

    /// End the session and drop every dynamically registered route
    pub async fn logout(&mut self) -> ConsoleResult<()> {
        let ended = self.session.logout().await;
        reset_routes(&mut self.permissions, &mut self.router);
        let cleared = self.permissions.clear();
        ended?;
        cleared?;
        info!("logged out");
        Ok(())
    }

    /// React to a failed request: an expired session resets the routes and
    /// lands on the login page. Other errors are left to the caller.
    pub async fn recover(&mut self, error: &ConsoleError) -> Result<Option<Navigation>, NavigationError> {
        if !matches!(error, ConsoleError::SessionExpired) {
            return Ok(None);
        }

        if let Err(e) = self.session.clear_auth() {
            warn!("failed to clear session state: {}", e);
        }
        reset_routes(&mut self.permissions, &mut self.router);
        self.navigate(LOGIN_PATH).await.map(Some)
    }

    pub fn requirements(&self) -> RequirementStore {
        RequirementStore::new(self.client.clone())
    }

    pub fn testcases(&self) -> TestCaseStore {
        TestCaseStore::new(self.client.clone())
    }

    pub fn prompts(&self) -> PromptStore {
        PromptStore::new(self.client.clone())
    }

    pub fn knowledge(&self) -> KnowledgeStore {
        KnowledgeStore::new(self.client.clone())
    }

    pub fn llm_configs(&self) -> LlmConfigStore {
        LlmConfigStore::new(self.client.clone())
    }

    pub fn reviews(&self) -> ReviewStore {
        ReviewStore::new(self.client.clone())
    }
}
