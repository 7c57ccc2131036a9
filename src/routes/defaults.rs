//! Built-in route tables.

use super::{RouteDefinition, RouteMeta, ViewId};

pub const NOT_FOUND_ROUTE: &str = "NotFound";
pub const NOT_FOUND_PATH: &str = "/404";
pub const CATCH_ALL_PATH: &str = "/:pathMatch(.*)*";

/// Routes reachable without logging in; registered at router construction
pub fn constant_routes() -> Vec<RouteDefinition> {
    vec![
        RouteDefinition::new("/login", "Login")
            .component(ViewId::Login)
            .meta(RouteMeta::titled("登录")),
        RouteDefinition::new("/register", "Register")
            .component(ViewId::Register)
            .meta(RouteMeta::titled("注册")),
        RouteDefinition::new("/reset-password", "ResetPassword")
            .component(ViewId::ResetPassword)
            .meta(RouteMeta::titled("重置密码")),
        RouteDefinition::new(NOT_FOUND_PATH, "404")
            .component(ViewId::NotFound)
            .meta(RouteMeta::titled("页面不存在")),
    ]
}

fn section(path: &str, name: &str, redirect: &str, children: Vec<RouteDefinition>) -> RouteDefinition {
    RouteDefinition::new(path, name)
        .component(ViewId::Layout)
        .redirect(redirect)
        .meta(RouteMeta {
            requires_auth: true,
            ..RouteMeta::default()
        })
        .children(children)
}

fn page(path: &str, name: &str, view: ViewId, title: &str, icon: &str) -> RouteDefinition {
    RouteDefinition::new(path, name)
        .component(view)
        .meta(RouteMeta::titled(title).with_icon(icon))
}

/// Fallback application routes, registered on every materialization so the
/// console stays usable when the backend has no menus or the refresh failed
pub fn default_async_routes() -> Vec<RouteDefinition> {
    vec![
        section(
            "/",
            "Root",
            "/dashboard",
            vec![
                page("dashboard", "Home", ViewId::Dashboard, "首页", "DataBoard"),
                page("ai-assistant", "AIAssistant", ViewId::AiAssistant, "AI助手", "ChatLineRound"),
            ],
        ),
        section(
            "/testing",
            "Testing",
            "/testing/testcases",
            vec![
                page("testcases", "TestCases", ViewId::TestCases, "用例管理", "List"),
                page("generate", "Generate", ViewId::Generate, "生成用例", "MagicStick"),
                page("requirements", "Requirements", ViewId::Requirements, "需求管理", "Document"),
            ],
        ),
        section(
            "/knowledge",
            "Knowledge",
            "/knowledge/knowledges",
            vec![
                page("knowledges", "Knowledges", ViewId::Knowledge, "知识库管理", "Reading"),
                page("prompts", "Prompts", ViewId::Prompts, "提示词管理", "ChatDotRound"),
            ],
        ),
        section(
            "/system",
            "System",
            "/system/users",
            vec![
                page("users", "Users", ViewId::Users, "用户管理", "User"),
                page("roles", "Roles", ViewId::Roles, "角色管理", "UserFilled"),
                page("menus", "Menus", ViewId::Menus, "菜单管理", "Menu"),
                page("llm-configs", "LLMConfigs", ViewId::LlmConfigs, "大模型配置", "Connection"),
                page("mcp-configs", "MCPConfigs", ViewId::McpConfigs, "MCP配置", "Connection"),
                page("logs", "Logs", ViewId::Logs, "日志与审计", "DocumentCopy"),
            ],
        ),
    ]
}

/// Catch-all registered last; unmatched paths land on `/404`
pub fn not_found_route() -> RouteDefinition {
    RouteDefinition::new(CATCH_ALL_PATH, NOT_FOUND_ROUTE).redirect(NOT_FOUND_PATH)
}
