//! Menu tree → route tree.
//!
//! One recursive mapping: buttons are dropped together with their subtree,
//! everything else becomes a [`RouteDefinition`] with defaulted meta and a
//! statically resolved view. An unknown view is recorded and leaves that one
//! route without a component.

use crate::menu::MenuNode;

use super::views::{ViewId, ViewRegistry};
use super::{RouteDefinition, RouteError, RouteMeta};

const LAYOUT_COMPONENT: &str = "Layout";

/// Routes compiled from a menu forest, plus the nodes whose component could
/// not be resolved. Those nodes are still present in `routes` with no view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledMenus {
    pub routes: Vec<RouteDefinition>,
    pub unresolved: Vec<RouteError>,
}

/// Compile a permission-scoped menu forest, preserving sibling order.
///
/// The tree is trusted to be finite and acyclic; no deduplication is done.
pub fn compile_menus(menus: &[MenuNode]) -> CompiledMenus {
    let mut unresolved = Vec::new();
    let routes = compile_level(menus, &mut unresolved);
    CompiledMenus { routes, unresolved }
}

fn compile_level(menus: &[MenuNode], unresolved: &mut Vec<RouteError>) -> Vec<RouteDefinition> {
    menus
        .iter()
        .filter_map(|menu| compile_node(menu, unresolved))
        .collect()
}

fn compile_node(menu: &MenuNode, unresolved: &mut Vec<RouteError>) -> Option<RouteDefinition> {
    if menu.is_button() {
        return None;
    }

    let meta = RouteMeta {
        title: menu.meta.title.clone().or_else(|| Some(menu.name.clone())),
        icon: menu.meta.icon.clone(),
        hidden: menu.meta.hidden.unwrap_or(false),
        keep_alive: menu.meta.keep_alive.unwrap_or(false),
        permission: menu.meta.permission.clone(),
        requires_auth: false,
    };

    let component = match menu.component.as_deref().filter(|c| !c.is_empty()) {
        Some(declared) => match resolve_component(&menu.name, declared) {
            Ok(view) => Some(view),
            Err(e) => {
                unresolved.push(e);
                None
            }
        },
        None => None,
    };

    let children = compile_level(&menu.children, unresolved);

    Some(RouteDefinition {
        path: menu.path.clone(),
        name: menu.name.clone(),
        component,
        redirect: menu.redirect.clone(),
        meta,
        children,
    })
}

/// Resolve a declared component string to a view.
///
/// `Layout` wins over everything; otherwise the bare name (prefix and `.vue`
/// stripped) is looked up by logical name, then by module file stem.
pub fn resolve_component(route: &str, declared: &str) -> Result<ViewId, RouteError> {
    if declared == LAYOUT_COMPONENT {
        return Ok(ViewId::Layout);
    }

    let bare = bare_component_name(declared);
    ViewRegistry::by_logical_name(bare)
        .or_else(|| ViewRegistry::by_module_stem(bare))
        .ok_or_else(|| RouteError::UnknownView {
            route: route.to_string(),
            component: declared.to_string(),
        })
}

fn bare_component_name(declared: &str) -> &str {
    let name = declared.rsplit('/').next().unwrap_or(declared);
    name.strip_suffix(".vue").unwrap_or(name)
}
