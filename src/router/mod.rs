//! In-process route table standing in for the browser router.

pub mod guard;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;
use url::form_urlencoded;

use crate::routes::defaults::constant_routes;
use crate::routes::{RouteDefinition, RouteMeta, ViewId};

pub use guard::{
    document_title, materialize_routes, reset_routes, GuardOutcome, GuardState, NavigationGuard,
    HOME_PATH, LOGIN_PATH, WHITE_LIST,
};

const MAX_REDIRECTS: usize = 10;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouterError {
    #[error("Route name '{0}' is already registered")]
    DuplicateName(String),

    #[error("No route matches '{0}'")]
    NoMatch(String),

    #[error("Redirect loop while resolving '{0}'")]
    RedirectLoop(String),
}

/// A navigation target: path plus query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub path: String,
    pub query: BTreeMap<String, String>,
}

impl Location {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            query: BTreeMap::new(),
        }
    }

    /// Parse `"/path?a=1"`; a path without a leading slash gets one
    pub fn parse(raw: &str) -> Self {
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (raw, None),
        };

        let path = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };

        let query = query
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        Self { path, query }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Path with percent-encoded query, as it would appear in the address bar
    pub fn full_path(&self) -> String {
        if self.query.is_empty() {
            return self.path.clone();
        }
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.query.iter())
            .finish();
        format!("{}?{}", self.path, query)
    }

    /// Login location that returns the user to `original` afterwards
    pub fn login_redirect(original: &Location) -> Self {
        Location::new(LOGIN_PATH).with_query("redirect", original.full_path())
    }

    /// Where a login page should send the user once authenticated
    pub fn redirect_target(&self) -> Option<Location> {
        self.query
            .get("redirect")
            .filter(|target| !target.is_empty())
            .map(|target| Location::parse(target))
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_path())
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Static(String),
    Param(String),
    CatchAll(String),
}

#[derive(Debug, Clone)]
struct RouteRecord {
    name: String,
    full_path: String,
    segments: Vec<Segment>,
    component: Option<ViewId>,
    redirect: Option<String>,
    meta: RouteMeta,
    /// Names from the top-level route down to this one
    chain: Vec<String>,
}

impl RouteRecord {
    fn match_path(&self, parts: &[&str]) -> Option<BTreeMap<String, String>> {
        let mut params = BTreeMap::new();
        let mut idx = 0;
        for segment in &self.segments {
            match segment {
                Segment::CatchAll(name) => {
                    params.insert(name.clone(), parts[idx.min(parts.len())..].join("/"));
                    return Some(params);
                }
                Segment::Static(expected) => {
                    if parts.get(idx) != Some(&expected.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    params.insert(name.clone(), parts.get(idx)?.to_string());
                }
            }
            idx += 1;
        }
        (idx == parts.len()).then_some(params)
    }

    /// Higher is more specific: static beats param beats catch-all
    fn rank(&self) -> (bool, usize) {
        let catch_all = self.segments.iter().any(|s| matches!(s, Segment::CatchAll(_)));
        let statics = self.segments.iter().filter(|s| matches!(s, Segment::Static(_))).count();
        (!catch_all, statics)
    }
}

/// Result of resolving a path against the table
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedRoute {
    pub name: String,
    pub path: String,
    pub matched: Vec<String>,
    pub params: BTreeMap<String, String>,
    pub component: Option<ViewId>,
    pub meta: RouteMeta,
    pub redirected_from: Option<String>,
}

#[derive(Debug)]
pub struct Router {
    routes: Vec<RouteDefinition>,
    records: Vec<RouteRecord>,
    history: Vec<Location>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

impl Router {
    /// Router with the constant (unauthenticated) routes registered
    pub fn new() -> Self {
        let mut router = Self::empty();
        for route in constant_routes() {
            // constant names are unique
            let _ = router.add_route(route);
        }
        router
    }

    pub fn empty() -> Self {
        Self {
            routes: Vec::new(),
            records: Vec::new(),
            history: Vec::new(),
        }
    }

    pub fn add_route(&mut self, route: RouteDefinition) -> Result<(), RouterError> {
        if let Some(duplicate) = route.names().into_iter().find(|name| self.has_route(name)) {
            return Err(RouterError::DuplicateName(duplicate.to_string()));
        }
        tracing::debug!(name = %route.name, path = %route.path, "route registered");
        self.routes.push(route);
        self.rebuild();
        Ok(())
    }

    /// Remove a route (top-level or nested) and its children
    pub fn remove_route(&mut self, name: &str) -> bool {
        let removed = remove_named(&mut self.routes, name);
        if removed {
            tracing::debug!(%name, "route removed");
            self.rebuild();
        }
        removed
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.name == name)
    }

    pub fn routes(&self) -> &[RouteDefinition] {
        &self.routes
    }

    pub fn route_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    pub fn resolve(&self, path: &str) -> Result<ResolvedRoute, RouterError> {
        let mut current = path.to_string();
        let mut redirected_from = None;

        for _ in 0..MAX_REDIRECTS {
            let (record, params) = self
                .best_match(&current)
                .ok_or_else(|| RouterError::NoMatch(current.clone()))?;

            match &record.redirect {
                Some(target) => {
                    redirected_from.get_or_insert_with(|| path.to_string());
                    current = target.clone();
                }
                None => {
                    return Ok(ResolvedRoute {
                        name: record.name.clone(),
                        path: current,
                        matched: record.chain.clone(),
                        params,
                        component: record.component,
                        meta: self.merged_meta(record),
                        redirected_from,
                    })
                }
            }
        }

        Err(RouterError::RedirectLoop(path.to_string()))
    }

    pub fn push(&mut self, location: Location) {
        self.history.push(location);
    }

    pub fn replace(&mut self, location: Location) {
        match self.history.last_mut() {
            Some(last) => *last = location,
            None => self.history.push(location),
        }
    }

    pub fn current(&self) -> Option<&Location> {
        self.history.last()
    }

    pub fn history(&self) -> &[Location] {
        &self.history
    }

    fn best_match(&self, path: &str) -> Option<(&RouteRecord, BTreeMap<String, String>)> {
        let parts = split_path(path);
        let mut best: Option<(&RouteRecord, BTreeMap<String, String>)> = None;
        for record in &self.records {
            if let Some(params) = record.match_path(&parts) {
                let better = match &best {
                    Some((current, _)) => record.rank() > current.rank(),
                    None => true,
                };
                if better {
                    best = Some((record, params));
                }
            }
        }
        best
    }

    // Ancestors contribute `requires_auth`; the leaf owns everything else
    fn merged_meta(&self, record: &RouteRecord) -> RouteMeta {
        let mut meta = record.meta.clone();
        meta.requires_auth = record.chain.iter().any(|name| {
            self.records
                .iter()
                .find(|r| &r.name == name)
                .is_some_and(|r| r.meta.requires_auth)
        });
        meta
    }

    fn rebuild(&mut self) {
        let mut records = Vec::new();
        for route in &self.routes {
            flatten(route, "", &[], &mut records);
        }
        self.records = records;
    }
}

fn flatten(route: &RouteDefinition, parent_path: &str, parent_chain: &[String], out: &mut Vec<RouteRecord>) {
    let full_path = join_path(parent_path, &route.path);
    let mut chain = parent_chain.to_vec();
    chain.push(route.name.clone());

    out.push(RouteRecord {
        name: route.name.clone(),
        full_path: full_path.clone(),
        segments: parse_segments(&full_path),
        component: route.component,
        redirect: route.redirect.clone(),
        meta: route.meta.clone(),
        chain: chain.clone(),
    });

    for child in &route.children {
        flatten(child, &full_path, &chain, out);
    }
}

fn remove_named(routes: &mut Vec<RouteDefinition>, name: &str) -> bool {
    if let Some(pos) = routes.iter().position(|r| r.name == name) {
        routes.remove(pos);
        return true;
    }
    routes.iter_mut().any(|r| remove_named(&mut r.children, name))
}

fn join_path(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        return child.to_string();
    }
    if parent.is_empty() {
        return format!("/{}", child);
    }
    if child.is_empty() {
        return parent.to_string();
    }
    format!("{}/{}", parent.trim_end_matches('/'), child)
}

fn split_path(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn parse_segments(path: &str) -> Vec<Segment> {
    split_path(path)
        .into_iter()
        .map(|part| match part.strip_prefix(':') {
            Some(param) => {
                let name = param.split('(').next().unwrap_or(param).trim_end_matches(['?', '*', '+']);
                if param.ends_with(")*") || param.ends_with(")+") {
                    Segment::CatchAll(name.to_string())
                } else {
                    Segment::Param(name.to_string())
                }
            }
            None => Segment::Static(part.to_string()),
        })
        .collect()
}

impl fmt::Display for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for record in &self.records {
            let depth = record.chain.len().saturating_sub(1);
            write!(f, "{}{} ({})", "  ".repeat(depth), record.full_path, record.name)?;
            if let Some(view) = record.component {
                write!(f, " -> {}", view)?;
            }
            if let Some(target) = &record.redirect {
                write!(f, " => {}", target)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
