use serde_json::json;

use crate::cli::utils::output_value;
use crate::cli::OutputFormat;
use crate::console::Console;

pub async fn handle(path: &str, console: &mut Console, output_format: OutputFormat) -> anyhow::Result<()> {
    let navigation = console.navigate(path).await?;

    let value = json!({
        "location": navigation.location.full_path(),
        "route": navigation.route.name,
        "component": navigation.route.component.map(|view| view.module_path()),
        "title": navigation.title,
        "replaced": navigation.replaced,
        "redirects": navigation.redirects,
    });

    output_value(&output_format, &value, || {
        let mut lines = vec![format!(
            "{} -> {} ({})",
            path,
            navigation.location,
            navigation.route.name
        )];
        lines.push(format!("Title: {}", navigation.title));
        if !navigation.redirects.is_empty() {
            lines.push(format!("Redirected from: {}", navigation.redirects.join(" -> ")));
        }
        lines.join("\n")
    })
}
