use std::fs;
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::console::Console;
use crate::http::Blob;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(fields)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(fields);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": false,
                "error": message
            });

            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Pretty JSON for `--json`, `text` otherwise
pub fn output_value(output_format: &OutputFormat, value: &Value, text: impl FnOnce() -> String) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}

/// One line per row: `#id  label`
pub fn summarize_row(row: &Value) -> String {
    let id = row.get("id").map(Value::to_string).unwrap_or_else(|| "-".to_string());
    let label = ["title", "name", "username", "content"]
        .iter()
        .find_map(|key| row.get(*key).and_then(Value::as_str))
        .unwrap_or("");
    format!("#{:<6} {}", id, label)
}

/// Parse a JSON argument; `-` reads stdin and `@path` reads a file
pub fn read_json_arg(raw: Option<&str>) -> anyhow::Result<Value> {
    let text = match raw {
        None | Some("-") => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).context("failed to read JSON from stdin")?;
            buffer
        }
        Some(raw) => match raw.strip_prefix('@') {
            Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?,
            None => raw.to_string(),
        },
    };
    serde_json::from_str(&text).context("invalid JSON")
}

/// Use the provided value or read one line from stdin
pub fn read_secret(provided: Option<String>, prompt: &str) -> anyhow::Result<String> {
    if let Some(value) = provided {
        return Ok(value);
    }
    eprint!("{}: ", prompt);
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Write a downloaded file, defaulting to the server's filename
pub fn save_blob(blob: &Blob, output: Option<PathBuf>, fallback: &str) -> anyhow::Result<PathBuf> {
    let path = output.unwrap_or_else(|| PathBuf::from(blob.filename.as_deref().unwrap_or(fallback)));
    fs::write(&path, &blob.bytes).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(path)
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string())
}

/// Fail early with a hint when no token is stored
pub fn require_login(console: &Console) -> anyhow::Result<()> {
    if !console.session.has_stored_token() {
        anyhow::bail!("Not logged in. Run 'tcg auth login <account>' first");
    }
    Ok(())
}

/// Recover from an expired session, then hand the error to the caller
pub async fn report_failure(
    console: &mut Console,
    output_format: &OutputFormat,
    error: crate::error::ConsoleError,
) -> anyhow::Error {
    if let Ok(Some(navigation)) = console.recover(&error).await {
        tracing::info!(to = %navigation.location, "session ended, returned to login");
    }
    if let OutputFormat::Json = output_format {
        let _ = output_error(output_format, &error.to_string(), Some(error.error_code()));
    }
    anyhow::Error::new(error)
}
