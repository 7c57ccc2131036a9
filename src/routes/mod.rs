pub mod compiler;
pub mod defaults;
pub mod views;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use compiler::{compile_menus, resolve_component, CompiledMenus};
pub use views::{ViewId, ViewRegistry};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RouteError {
    #[error("Route '{route}' declares unknown component '{component}'")]
    UnknownView { route: String, component: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub keep_alive: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
    #[serde(default)]
    pub requires_auth: bool,
}

impl RouteMeta {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// A compiled route, owned by the router once registered
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDefinition {
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<ViewId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub meta: RouteMeta,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RouteDefinition>,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            component: None,
            redirect: None,
            meta: RouteMeta::default(),
            children: Vec::new(),
        }
    }

    pub fn component(mut self, view: ViewId) -> Self {
        self.component = Some(view);
        self
    }

    pub fn redirect(mut self, target: impl Into<String>) -> Self {
        self.redirect = Some(target.into());
        self
    }

    pub fn meta(mut self, meta: RouteMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn children(mut self, children: Vec<RouteDefinition>) -> Self {
        self.children = children;
        self
    }

    /// Names of this route and all of its descendants, depth first
    pub fn names(&self) -> Vec<&str> {
        let mut names = vec![self.name.as_str()];
        for child in &self.children {
            names.extend(child.names());
        }
        names
    }
}
