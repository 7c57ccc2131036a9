//! Server-supplied menu tree, read-only on the client.

use serde::{Deserialize, Serialize};

/// Menu node kind. The backend sends `directory`, `menu` or `button`; any
/// value other than `button` (including a missing one) is a navigable page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeType {
    Button,
    #[default]
    #[serde(other)]
    Page,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_alive: Option<bool>,
    /// Permission code guarding this entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permission: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(default)]
    pub path: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "node_type_or_page")]
    pub node_type: NodeType,
    #[serde(default, deserialize_with = "meta_or_default")]
    pub meta: MenuMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuNode>,
}

impl MenuNode {
    pub fn page(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: None,
            parent_id: None,
            path: path.into(),
            name: name.into(),
            component: None,
            redirect: None,
            node_type: NodeType::Page,
            meta: MenuMeta::default(),
            sort: None,
            children: Vec::new(),
        }
    }

    pub fn button(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            node_type: NodeType::Button,
            ..Self::page(path, name)
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    pub fn with_redirect(mut self, redirect: impl Into<String>) -> Self {
        self.redirect = Some(redirect.into());
        self
    }

    pub fn with_meta(mut self, meta: MenuMeta) -> Self {
        self.meta = meta;
        self
    }

    pub fn with_children(mut self, children: Vec<MenuNode>) -> Self {
        self.children = children;
        self
    }

    pub fn is_button(&self) -> bool {
        self.node_type == NodeType::Button
    }
}

// `type: null` and `meta: null` both show up in hand-edited menu rows
fn node_type_or_page<'de, D>(deserializer: D) -> Result<NodeType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<NodeType>::deserialize(deserializer)?.unwrap_or_default())
}

fn meta_or_default<'de, D>(deserializer: D) -> Result<MenuMeta, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<MenuMeta>::deserialize(deserializer)?.unwrap_or_default())
}
