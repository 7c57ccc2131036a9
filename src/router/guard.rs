//! Navigation guard: login check, one-time permission refresh and route
//! materialization, evaluated on every navigation attempt.

use crate::permission::{PermissionSource, PermissionStore};
use crate::routes::compile_menus;
use crate::routes::defaults::{default_async_routes, not_found_route};
use crate::routes::{RouteDefinition, RouteMeta};

use super::{Location, Router, RouterError};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

/// Paths reachable without a token
pub const WHITE_LIST: &[&str] = &["/login", "/register", "/reset-password", "/404"];

const APP_TITLE: &str = "TestCase Generator";
const UNTITLED_PAGE: &str = "测试用例生成器";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Unauthenticated,
    AuthenticatedNoRoutes,
    AuthenticatedRoutesPending,
    AuthenticatedReady,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    Proceed,
    /// Abandon this attempt and navigate somewhere else
    Redirect(Location),
    /// Routes were just registered; retry the same target, replacing history
    Redispatch(Location),
}

/// What a materialization pass did, for logging and tests
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterializeReport {
    pub refreshed: bool,
    pub registered: Vec<String>,
    pub skipped: Vec<String>,
    pub failures: Vec<String>,
}

#[derive(Debug)]
pub struct NavigationGuard {
    cold_start: bool,
    materializing: bool,
}

impl NavigationGuard {
    /// `cold_start` is true for the first navigation after process start
    /// (the equivalent of a full page load)
    pub fn new(cold_start: bool) -> Self {
        Self {
            cold_start,
            materializing: false,
        }
    }

    pub fn is_cold_start(&self) -> bool {
        self.cold_start
    }

    pub fn state(&self, authenticated: bool, permissions: &PermissionStore) -> GuardState {
        if !authenticated {
            GuardState::Unauthenticated
        } else if self.materializing {
            GuardState::AuthenticatedRoutesPending
        } else if permissions.routes_added() && !self.cold_start {
            GuardState::AuthenticatedReady
        } else {
            GuardState::AuthenticatedNoRoutes
        }
    }

    pub async fn before_each(
        &mut self,
        to: &Location,
        authenticated: bool,
        permissions: &mut PermissionStore,
        router: &mut Router,
        source: &dyn PermissionSource,
    ) -> GuardOutcome {
        let path = to.path.as_str();

        if WHITE_LIST.contains(&path) {
            if authenticated && path == LOGIN_PATH {
                return GuardOutcome::Redirect(Location::new(HOME_PATH));
            }
            return GuardOutcome::Proceed;
        }

        if !authenticated {
            tracing::debug!(target_path = %to, "no token, redirecting to login");
            return GuardOutcome::Redirect(Location::login_redirect(to));
        }

        if self.cold_start || !permissions.routes_added() {
            self.materializing = true;
            tracing::debug!(
                state = ?self.state(authenticated, permissions),
                cold_start = self.cold_start,
                "materializing routes"
            );
            let report = materialize_routes(permissions, router, source).await;
            self.materializing = false;
            tracing::info!(
                refreshed = report.refreshed,
                registered = report.registered.len(),
                failures = report.failures.len(),
                "routes materialized"
            );
            self.cold_start = false;
            return GuardOutcome::Redispatch(to.clone());
        }

        GuardOutcome::Proceed
    }
}

/// Refresh permissions, drop stale dynamic routes and register the defaults
/// plus whatever the menu tree compiles to.
///
/// Never fails: a refresh failure is logged and the default routes are still
/// registered. A menu node with an unknown view is logged and registered
/// without one. No retry.
pub async fn materialize_routes(
    permissions: &mut PermissionStore,
    router: &mut Router,
    source: &dyn PermissionSource,
) -> MaterializeReport {
    let mut report = MaterializeReport::default();

    match permissions.refresh(source).await {
        Ok(()) => report.refreshed = true,
        Err(e) => {
            tracing::warn!("permission refresh failed, continuing with defaults: {}", e);
            report.failures.push(e.to_string());
        }
    }

    reset_routes(permissions, router);

    register_all(router, default_async_routes(), &mut report);

    if !permissions.menus().is_empty() {
        let compiled = compile_menus(permissions.menus());
        for e in compiled.unresolved {
            tracing::error!("menu route registered without a view: {}", e);
            report.failures.push(e.to_string());
        }
        register_all(router, compiled.routes, &mut report);
    }

    register_all(router, vec![not_found_route()], &mut report);

    permissions.mark_routes_added(report.registered.clone());
    report
}

fn register_all(router: &mut Router, routes: Vec<RouteDefinition>, report: &mut MaterializeReport) {
    for route in routes {
        let name = route.name.clone();
        if router.has_route(&name) {
            report.skipped.push(name);
            continue;
        }
        match router.add_route(route) {
            Ok(()) => report.registered.push(name),
            Err(RouterError::DuplicateName(dup)) => {
                tracing::warn!(route = %name, duplicate = %dup, "route skipped, nested name already registered");
                report.skipped.push(name);
            }
            Err(e) => {
                tracing::warn!(route = %name, "route skipped: {}", e);
                report.skipped.push(name);
            }
        }
    }
}

/// Remove every dynamically registered route and clear the routes-added flag
pub fn reset_routes(permissions: &mut PermissionStore, router: &mut Router) {
    let mut names: Vec<String> = permissions.dynamic_routes().to_vec();
    names.extend(default_async_routes().into_iter().map(|r| r.name));
    for name in names {
        router.remove_route(&name);
    }
    permissions.clear_routes();
}

pub fn document_title(meta: &RouteMeta) -> String {
    format!("{} - {}", meta.title.as_deref().unwrap_or(UNTITLED_PAGE), APP_TITLE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ConsoleError, ConsoleResult};
    use crate::menu::MenuNode;
    use crate::storage::MemoryStorage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeSource {
        menus: Vec<MenuNode>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeSource {
        fn with_menus(menus: Vec<MenuNode>) -> Self {
            Self {
                menus,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                menus: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }

        fn refreshes(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PermissionSource for FakeSource {
        async fn fetch_menus(&self) -> ConsoleResult<Vec<MenuNode>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ConsoleError::Transport("connection refused".into()));
            }
            Ok(self.menus.clone())
        }

        async fn fetch_permission_codes(&self) -> ConsoleResult<Vec<String>> {
            if self.fail {
                return Err(ConsoleError::Transport("connection refused".into()));
            }
            Ok(vec!["testcase:view".into()])
        }
    }

    fn store() -> PermissionStore {
        PermissionStore::load(MemoryStorage::shared())
    }

    fn audit_menu() -> Vec<MenuNode> {
        vec![MenuNode::page("/audit", "Audit")
            .with_component("Layout")
            .with_children(vec![
                MenuNode::page("trail", "AuditTrail").with_component("LogView"),
                MenuNode::button("export", "AuditExport"),
            ])]
    }

    #[tokio::test]
    async fn white_listed_paths_pass_without_token() {
        let mut guard = NavigationGuard::new(true);
        let mut perms = store();
        let mut router = Router::new();
        let source = FakeSource::with_menus(vec![]);

        for path in WHITE_LIST {
            let outcome = guard
                .before_each(&Location::new(*path), false, &mut perms, &mut router, &source)
                .await;
            assert_eq!(outcome, GuardOutcome::Proceed, "path {}", path);
        }
        assert_eq!(source.refreshes(), 0);
    }

    #[tokio::test]
    async fn login_with_token_goes_home() {
        let mut guard = NavigationGuard::new(false);
        let mut perms = store();
        let mut router = Router::new();
        let source = FakeSource::with_menus(vec![]);

        let outcome = guard
            .before_each(&Location::new(LOGIN_PATH), true, &mut perms, &mut router, &source)
            .await;
        assert_eq!(outcome, GuardOutcome::Redirect(Location::new(HOME_PATH)));
    }

    #[tokio::test]
    async fn protected_path_without_token_redirects_with_target() {
        let mut guard = NavigationGuard::new(true);
        let mut perms = store();
        let mut router = Router::new();
        let source = FakeSource::with_menus(vec![]);
        let to = Location::parse("/system/users?page=3");

        let outcome = guard.before_each(&to, false, &mut perms, &mut router, &source).await;
        match outcome {
            GuardOutcome::Redirect(login) => {
                assert_eq!(login.path, LOGIN_PATH);
                assert_eq!(login.redirect_target(), Some(to));
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(guard.state(false, &perms), GuardState::Unauthenticated);
    }

    #[tokio::test]
    async fn cold_start_refreshes_once_then_proceeds() {
        let mut guard = NavigationGuard::new(true);
        let mut perms = store();
        let mut router = Router::new();
        let source = FakeSource::with_menus(audit_menu());
        let to = Location::new("/audit/trail");

        assert_eq!(guard.state(true, &perms), GuardState::AuthenticatedNoRoutes);

        let first = guard.before_each(&to, true, &mut perms, &mut router, &source).await;
        assert_eq!(first, GuardOutcome::Redispatch(to.clone()));
        assert_eq!(source.refreshes(), 1);
        assert!(router.has_route("Audit"));
        assert!(router.has_route("AuditTrail"));
        assert!(!router.has_route("AuditExport"));

        let second = guard.before_each(&to, true, &mut perms, &mut router, &source).await;
        assert_eq!(second, GuardOutcome::Proceed);
        assert_eq!(source.refreshes(), 1);
        assert_eq!(guard.state(true, &perms), GuardState::AuthenticatedReady);

        // a fresh guard in the same process still counts as a cold start
        let restarted = NavigationGuard::new(true);
        assert_eq!(restarted.state(true, &perms), GuardState::AuthenticatedNoRoutes);
    }

    #[tokio::test]
    async fn refresh_failure_still_registers_defaults() {
        let mut guard = NavigationGuard::new(true);
        let mut perms = store();
        let mut router = Router::new();
        let source = FakeSource::failing();
        let to = Location::new("/dashboard");

        let outcome = guard.before_each(&to, true, &mut perms, &mut router, &source).await;
        assert_eq!(outcome, GuardOutcome::Redispatch(to.clone()));
        assert!(router.has_route("Root"));
        assert!(router.has_route("System"));
        assert!(router.has_route("NotFound"));
        assert!(perms.routes_added());

        // the failed refresh is not retried on the next navigation
        let next = Location::new("/testing/testcases");
        let outcome = guard.before_each(&next, true, &mut perms, &mut router, &source).await;
        assert_eq!(outcome, GuardOutcome::Proceed);
        assert_eq!(source.refreshes(), 1);
        assert_eq!(guard.state(true, &perms), GuardState::AuthenticatedReady);
    }

    #[tokio::test]
    async fn materializing_twice_does_not_duplicate_names() {
        let mut perms = store();
        let mut router = Router::new();
        let source = FakeSource::with_menus(audit_menu());

        materialize_routes(&mut perms, &mut router, &source).await;
        let first: Vec<String> = router.route_names().into_iter().map(str::to_string).collect();
        materialize_routes(&mut perms, &mut router, &source).await;
        let second: Vec<String> = router.route_names().into_iter().map(str::to_string).collect();

        assert_eq!(first, second);
        let mut deduped = second.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), second.len());
    }

    #[tokio::test]
    async fn unknown_menu_component_keeps_sibling_routes() {
        let mut perms = store();
        let mut router = Router::new();
        let source = FakeSource::with_menus(vec![
            MenuNode::page("/x", "Broken").with_component("views/Missing.vue"),
            MenuNode::page("/audit", "Audit")
                .with_component("Layout")
                .with_children(vec![MenuNode::page("trail", "AuditTrail").with_component("LogView")]),
        ]);

        let report = materialize_routes(&mut perms, &mut router, &source).await;
        assert!(report.refreshed);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].contains("views/Missing.vue"));
        assert!(router.has_route("Broken"));
        assert!(router.has_route("Audit"));
        assert!(router.has_route("AuditTrail"));
        assert!(router.has_route("Root"));
    }

    #[tokio::test]
    async fn reset_removes_dynamic_routes_only() {
        let mut perms = store();
        let mut router = Router::new();
        let source = FakeSource::with_menus(audit_menu());
        materialize_routes(&mut perms, &mut router, &source).await;

        reset_routes(&mut perms, &mut router);

        assert!(!perms.routes_added());
        assert!(!router.has_route("Audit"));
        assert!(!router.has_route("Root"));
        assert!(!router.has_route("NotFound"));
        assert!(router.has_route("Login"));
        assert!(router.has_route("404"));
    }

    #[test]
    fn document_title_falls_back_when_untitled() {
        assert_eq!(document_title(&RouteMeta::titled("首页")), "首页 - TestCase Generator");
        assert_eq!(document_title(&RouteMeta::default()), "测试用例生成器 - TestCase Generator");
    }
}
