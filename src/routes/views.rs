use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// First-party views a route can render.
///
/// Closed set: menus referring to anything else fail materialization with
/// [`super::RouteError::UnknownView`] instead of attempting a runtime import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViewId {
    Layout,
    Dashboard,
    AiAssistant,
    TestCases,
    Generate,
    Requirements,
    Knowledge,
    Prompts,
    Users,
    Roles,
    Menus,
    LlmConfigs,
    McpConfigs,
    Logs,
    Login,
    Register,
    ResetPassword,
    NotFound,
}

impl ViewId {
    pub const ALL: [ViewId; 18] = [
        ViewId::Layout,
        ViewId::Dashboard,
        ViewId::AiAssistant,
        ViewId::TestCases,
        ViewId::Generate,
        ViewId::Requirements,
        ViewId::Knowledge,
        ViewId::Prompts,
        ViewId::Users,
        ViewId::Roles,
        ViewId::Menus,
        ViewId::LlmConfigs,
        ViewId::McpConfigs,
        ViewId::Logs,
        ViewId::Login,
        ViewId::Register,
        ViewId::ResetPassword,
        ViewId::NotFound,
    ];

    /// Name menus use to refer to this view, if menus may refer to it at all
    pub fn logical_name(self) -> Option<&'static str> {
        match self {
            ViewId::Layout => Some("Layout"),
            ViewId::Dashboard => Some("Home"),
            ViewId::AiAssistant => Some("AIAssistantView"),
            ViewId::TestCases => Some("TestCaseView"),
            ViewId::Generate => Some("GenerateView"),
            ViewId::Requirements => Some("RequirementView"),
            ViewId::Knowledge => Some("KnowledgeView"),
            ViewId::Prompts => Some("PromptView"),
            ViewId::Users => Some("UserView"),
            ViewId::Roles => Some("RoleView"),
            ViewId::Menus => Some("MenuView"),
            ViewId::LlmConfigs => Some("LLMConfigView"),
            ViewId::McpConfigs => Some("MCPConfigView"),
            ViewId::Logs => Some("LogView"),
            ViewId::Login | ViewId::Register | ViewId::ResetPassword | ViewId::NotFound => None,
        }
    }

    /// Module the view is loaded from
    pub fn module_path(self) -> &'static str {
        match self {
            ViewId::Layout => "layout/index",
            ViewId::Dashboard => "views/DashboardView",
            ViewId::AiAssistant => "views/AIAssistantView",
            ViewId::TestCases => "views/TestCaseView",
            ViewId::Generate => "views/GenerateView",
            ViewId::Requirements => "views/RequirementView",
            ViewId::Knowledge => "views/KnowledgeView",
            ViewId::Prompts => "views/PromptView",
            ViewId::Users => "views/UserView",
            ViewId::Roles => "views/RoleView",
            ViewId::Menus => "views/MenuView",
            ViewId::LlmConfigs => "views/LLMConfigView",
            ViewId::McpConfigs => "views/MCPConfigView",
            ViewId::Logs => "views/LogView",
            ViewId::Login => "views/LoginView",
            ViewId::Register => "views/RegisterView",
            ViewId::ResetPassword => "views/ResetPasswordView",
            ViewId::NotFound => "views/404View",
        }
    }

    fn module_stem(self) -> &'static str {
        let path = self.module_path();
        path.rsplit('/').next().unwrap_or(path)
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.module_path())
    }
}

static BY_LOGICAL_NAME: Lazy<HashMap<&'static str, ViewId>> = Lazy::new(|| {
    ViewId::ALL
        .iter()
        .filter_map(|view| view.logical_name().map(|name| (name, *view)))
        .collect()
});

// `layout/index` has the stem `index`, which no menu should resolve to
static BY_MODULE_STEM: Lazy<HashMap<&'static str, ViewId>> = Lazy::new(|| {
    ViewId::ALL
        .iter()
        .filter(|view| **view != ViewId::Layout)
        .map(|view| (view.module_stem(), *view))
        .collect()
});

pub struct ViewRegistry;

impl ViewRegistry {
    pub fn by_logical_name(name: &str) -> Option<ViewId> {
        BY_LOGICAL_NAME.get(name).copied()
    }

    pub fn by_module_stem(stem: &str) -> Option<ViewId> {
        BY_MODULE_STEM.get(stem).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logical_names_are_unique() {
        assert_eq!(BY_LOGICAL_NAME.len(), 14);
        assert_eq!(ViewRegistry::by_logical_name("Home"), Some(ViewId::Dashboard));
        assert_eq!(ViewRegistry::by_logical_name("LLMConfigView"), Some(ViewId::LlmConfigs));
        assert_eq!(ViewRegistry::by_logical_name("LoginView"), None);
    }

    #[test]
    fn module_stems_cover_non_layout_views() {
        assert_eq!(BY_MODULE_STEM.len(), ViewId::ALL.len() - 1);
        assert_eq!(ViewRegistry::by_module_stem("DashboardView"), Some(ViewId::Dashboard));
        assert_eq!(ViewRegistry::by_module_stem("404View"), Some(ViewId::NotFound));
        assert_eq!(ViewRegistry::by_module_stem("index"), None);
    }
}
