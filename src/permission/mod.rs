//! Permission codes and the server-supplied menu tree for the current session.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::ConsoleResult;
use crate::menu::MenuNode;
use crate::storage::{self, SharedStorage, MENUS_KEY, PERMISSIONS_KEY};

/// Where the guard gets `{menus, permissions}` from
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn fetch_menus(&self) -> ConsoleResult<Vec<MenuNode>>;
    async fn fetch_permission_codes(&self) -> ConsoleResult<Vec<String>>;
}

pub struct PermissionStore {
    storage: SharedStorage,
    permission_codes: BTreeSet<String>,
    menus: Vec<MenuNode>,
    routes_added: bool,
    dynamic_routes: Vec<String>,
}

impl PermissionStore {
    /// Restore the cached snapshot; a corrupt entry is dropped with a warning
    pub fn load(storage: SharedStorage) -> Self {
        let permission_codes = storage::get_json::<Vec<String>>(storage.as_ref(), PERMISSIONS_KEY)
            .unwrap_or_else(|e| {
                tracing::warn!("discarding cached permissions: {}", e);
                None
            })
            .unwrap_or_default()
            .into_iter()
            .collect();

        let menus = storage::get_json::<Vec<MenuNode>>(storage.as_ref(), MENUS_KEY)
            .unwrap_or_else(|e| {
                tracing::warn!("discarding cached menus: {}", e);
                None
            })
            .unwrap_or_default();

        Self {
            storage,
            permission_codes,
            menus,
            routes_added: false,
            dynamic_routes: Vec::new(),
        }
    }

    pub fn permissions(&self) -> &BTreeSet<String> {
        &self.permission_codes
    }

    pub fn menus(&self) -> &[MenuNode] {
        &self.menus
    }

    pub fn routes_added(&self) -> bool {
        self.routes_added
    }

    pub fn dynamic_routes(&self) -> &[String] {
        &self.dynamic_routes
    }

    /// An empty code is always granted
    pub fn has_permission(&self, code: &str) -> bool {
        code.is_empty() || self.permission_codes.contains(code)
    }

    pub fn has_any_permission(&self, codes: &[&str]) -> bool {
        codes.is_empty() || codes.iter().any(|c| self.permission_codes.contains(*c))
    }

    pub fn has_all_permissions(&self, codes: &[&str]) -> bool {
        codes.iter().all(|c| self.permission_codes.contains(*c))
    }

    pub fn set_permissions(&mut self, codes: Vec<String>) -> ConsoleResult<()> {
        self.permission_codes = codes.into_iter().collect();
        let persisted: Vec<&String> = self.permission_codes.iter().collect();
        storage::set_json(self.storage.as_ref(), PERMISSIONS_KEY, &persisted)?;
        Ok(())
    }

    pub fn set_menus(&mut self, menus: Vec<MenuNode>) -> ConsoleResult<()> {
        self.menus = menus;
        storage::set_json(self.storage.as_ref(), MENUS_KEY, &self.menus)?;
        Ok(())
    }

    /// Fetch menus and permission codes concurrently and persist both
    pub async fn refresh(&mut self, source: &dyn PermissionSource) -> ConsoleResult<()> {
        let (menus, codes) = futures::try_join!(source.fetch_menus(), source.fetch_permission_codes())
            .map_err(|e| {
                tracing::error!("failed to fetch permissions: {}", e);
                e
            })?;

        tracing::debug!(menus = menus.len(), permissions = codes.len(), "permissions refreshed");
        self.set_menus(menus)?;
        self.set_permissions(codes)?;
        Ok(())
    }

    /// Drop everything, including the persisted snapshot
    pub fn clear(&mut self) -> ConsoleResult<()> {
        self.permission_codes.clear();
        self.menus.clear();
        self.routes_added = false;
        self.dynamic_routes.clear();
        storage::remove_all(self.storage.as_ref(), &[PERMISSIONS_KEY, MENUS_KEY])?;
        Ok(())
    }

    pub(crate) fn mark_routes_added(&mut self, names: Vec<String>) {
        self.dynamic_routes = names;
        self.routes_added = true;
    }

    pub(crate) fn clear_routes(&mut self) {
        self.dynamic_routes.clear();
        self.routes_added = false;
    }
}
