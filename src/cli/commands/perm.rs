use clap::Subcommand;
use serde_json::{json, Map, Value};

use crate::cli::utils::{output_empty_collection, output_value, report_failure, require_login};
use crate::cli::OutputFormat;
use crate::console::Console;

#[derive(Subcommand)]
pub enum PermCommands {
    #[command(about = "Fetch and list permission codes")]
    List,

    #[command(about = "Check permission codes (exit 1 unless all are granted)")]
    Check {
        #[arg(required = true, help = "Permission codes, e.g. sys:user:export")]
        codes: Vec<String>,
        #[arg(long, help = "Succeed if any one code is granted")]
        any: bool,
    },
}

pub async fn handle(cmd: PermCommands, console: &mut Console, output_format: OutputFormat) -> anyhow::Result<()> {
    require_login(console)?;
    let api = console.auth().clone();
    if let Err(e) = console.permissions.refresh(&api).await {
        return Err(report_failure(console, &output_format, e).await);
    }

    match cmd {
        PermCommands::List => {
            let codes = console.permissions.permissions();
            if codes.is_empty() {
                return output_empty_collection(&output_format, "permissions", "No permissions granted");
            }
            let value = json!({ "permissions": codes });
            output_value(&output_format, &value, || {
                codes.iter().cloned().collect::<Vec<_>>().join("\n")
            })
        }
        PermCommands::Check { codes, any } => {
            let refs: Vec<&str> = codes.iter().map(String::as_str).collect();
            let granted = if any {
                console.permissions.has_any_permission(&refs)
            } else {
                console.permissions.has_all_permissions(&refs)
            };

            let per_code: Map<String, Value> = codes
                .iter()
                .map(|code| (code.clone(), Value::Bool(console.permissions.has_permission(code))))
                .collect();
            let value = json!({ "granted": granted, "codes": per_code });
            output_value(&output_format, &value, || {
                codes
                    .iter()
                    .map(|code| {
                        let mark = if console.permissions.has_permission(code) { "✓" } else { "✗" };
                        format!("{} {}", mark, code)
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;

            if !granted {
                anyhow::bail!("permission denied");
            }
            Ok(())
        }
    }
}
