use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Subcommand;
use serde_json::{json, Value};

use crate::cli::utils::{output_value, require_login};
use crate::cli::OutputFormat;
use crate::console::Console;
use crate::menu::MenuNode;
use crate::router::Router;
use crate::routes::compile_menus;

#[derive(Subcommand)]
pub enum RoutesCommands {
    #[command(about = "Refresh permissions and show the registered route tree")]
    Show,

    #[command(about = "Compile a menu tree JSON file into route definitions")]
    Compile {
        #[arg(help = "Menu tree JSON (array, or a {code, data} envelope)")]
        file: PathBuf,
    },
}

pub async fn handle(cmd: RoutesCommands, console: &mut Console, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        RoutesCommands::Show => {
            require_login(console)?;
            let report = console.materialize().await;
            let value = json!({
                "refreshed": report.refreshed,
                "registered": report.registered,
                "skipped": report.skipped,
                "failures": report.failures,
                "routes": console.router.routes(),
            });
            output_value(&output_format, &value, || {
                let mut text = console.router.to_string();
                for failure in &report.failures {
                    text.push_str(&format!("! {}\n", failure));
                }
                text.trim_end().to_string()
            })
        }
        RoutesCommands::Compile { file } => compile(&file, output_format),
    }
}

pub fn compile(file: &Path, output_format: OutputFormat) -> anyhow::Result<()> {
    let raw = fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let mut value: Value = serde_json::from_str(&raw).context("invalid JSON")?;
    if let Some(data) = value.get_mut("data") {
        value = data.take();
    }
    let menus: Vec<MenuNode> = serde_json::from_value(value).context("not a menu tree")?;

    let compiled = compile_menus(&menus);
    let unresolved: Vec<String> = compiled.unresolved.iter().map(ToString::to_string).collect();
    let routes = compiled.routes;

    let value = json!({ "routes": routes, "unresolved": unresolved });
    output_value(&output_format, &value, || {
        let mut router = Router::empty();
        for route in routes.clone() {
            if let Err(e) = router.add_route(route) {
                tracing::warn!("route not shown: {}", e);
            }
        }
        let mut text = router.to_string();
        for failure in &unresolved {
            text.push_str(&format!("! {}\n", failure));
        }
        text.trim_end().to_string()
    })?;

    if !unresolved.is_empty() {
        anyhow::bail!("{} menu node(s) declare an unknown view", unresolved.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_menus(value: &Value) -> PathBuf {
        let path = std::env::temp_dir().join(format!("tcg-menus-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn compile_accepts_envelope() {
        let path = write_menus(&json!({
            "code": 0,
            "data": [{"name": "Logs", "path": "/logs", "component": "LogView"}]
        }));
        assert!(compile(&path, OutputFormat::Json).is_ok());
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn compile_reports_unknown_view() {
        let path = write_menus(&json!([
            {"name": "Logs", "path": "/logs", "component": "LogView"},
            {"name": "ComponentLibrary", "path": "/components", "component": "ComponentLibraryView"}
        ]));
        let err = compile(&path, OutputFormat::Json).unwrap_err();
        assert!(err.to_string().contains("unknown view"));
        fs::remove_file(path).unwrap();
    }
}
