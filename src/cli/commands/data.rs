use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Subcommand, ValueEnum};
use serde_json::json;

use crate::api::{id_params, RecordId, Resource, KNOWLEDGE, LLM_CONFIGS, PROMPTS, REQUIREMENTS, REVIEWS, TESTCASES};
use crate::cli::utils::{
    file_name, output_empty_collection, output_success, output_value, read_json_arg, report_failure, require_login,
    save_blob, summarize_row,
};
use crate::cli::OutputFormat;
use crate::console::Console;
use crate::error::ConsoleResult;
use crate::http::{Blob, Params, Upload};
use crate::stores::ResourceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    Requirement,
    Testcase,
    Prompt,
    Knowledge,
    LlmConfig,
    Review,
}

impl ResourceKind {
    pub fn resource(self) -> Resource {
        match self {
            ResourceKind::Requirement => REQUIREMENTS,
            ResourceKind::Testcase => TESTCASES,
            ResourceKind::Prompt => PROMPTS,
            ResourceKind::Knowledge => KNOWLEDGE,
            ResourceKind::LlmConfig => LLM_CONFIGS,
            ResourceKind::Review => REVIEWS,
        }
    }
}

#[derive(Subcommand)]
pub enum DataCommands {
    #[command(about = "List one page of records")]
    List {
        #[arg(value_enum, help = "Resource family")]
        resource: ResourceKind,
        #[arg(long, default_value_t = 1, help = "Page number")]
        page: u32,
        #[arg(long, default_value_t = 10, help = "Rows per page")]
        per_page: u32,
        #[arg(long, help = "Keyword filter")]
        keyword: Option<String>,
        #[arg(long = "param", value_name = "KEY=VALUE", help = "Extra query parameter (repeatable)")]
        params: Vec<String>,
    },

    #[command(about = "Show a single record")]
    Show {
        #[arg(value_enum, help = "Resource family")]
        resource: ResourceKind,
        #[arg(help = "Record ID")]
        id: RecordId,
    },

    #[command(about = "Create a record from JSON (argument, @file or stdin)")]
    Create {
        #[arg(value_enum, help = "Resource family")]
        resource: ResourceKind,
        #[arg(help = "JSON body; '-' or omitted reads stdin")]
        body: Option<String>,
    },

    #[command(about = "Update a record from JSON (argument, @file or stdin)")]
    Update {
        #[arg(value_enum, help = "Resource family")]
        resource: ResourceKind,
        #[arg(help = "Record ID to update")]
        id: RecordId,
        #[arg(help = "JSON body; '-' or omitted reads stdin")]
        body: Option<String>,
    },

    #[command(about = "Delete a record")]
    Delete {
        #[arg(value_enum, help = "Resource family")]
        resource: ResourceKind,
        #[arg(help = "Record ID to delete")]
        id: RecordId,
    },

    #[command(about = "Download an export file")]
    Export {
        #[arg(value_enum, help = "Resource family (testcase, prompt, knowledge)")]
        resource: ResourceKind,
        #[arg(long, value_delimiter = ',', help = "Only these IDs (comma separated)")]
        ids: Option<Vec<RecordId>>,
        #[arg(short, long, help = "Output file path")]
        output: Option<PathBuf>,
    },

    #[command(about = "Download the import template")]
    Template {
        #[arg(value_enum, help = "Resource family (testcase, prompt, knowledge)")]
        resource: ResourceKind,
        #[arg(short, long, help = "Output file path")]
        output: Option<PathBuf>,
    },

    #[command(about = "Import records from a spreadsheet")]
    Import {
        #[arg(value_enum, help = "Resource family (testcase, prompt, knowledge)")]
        resource: ResourceKind,
        #[arg(help = "Input file path")]
        input: PathBuf,
    },
}

pub async fn handle(cmd: DataCommands, console: &mut Console, output_format: OutputFormat) -> anyhow::Result<()> {
    require_login(console)?;
    match run(cmd, console, &output_format).await {
        Ok(result) => result,
        Err(e) => Err(report_failure(console, &output_format, e).await),
    }
}

// Outer result carries backend failures, inner one local I/O and output
async fn run(cmd: DataCommands, console: &Console, output_format: &OutputFormat) -> ConsoleResult<anyhow::Result<()>> {
    let store = |kind: ResourceKind| ResourceStore::new(console.client().clone(), kind.resource());

    match cmd {
        DataCommands::List {
            resource,
            page,
            per_page,
            keyword,
            params,
        } => {
            let query = match list_params(page, per_page, keyword, &params) {
                Ok(query) => query,
                Err(e) => return Ok(Err(e)),
            };
            let mut records = store(resource);
            let page = records.fetch_list(&query).await?;
            if page.items.is_empty() {
                return Ok(output_empty_collection(output_format, records.label(), "No records found"));
            }
            let value = json!({ "items": page.items, "total": page.total });
            Ok(output_value(output_format, &value, || {
                let mut lines: Vec<String> = page.items.iter().map(summarize_row).collect();
                lines.push(format!("({} of {})", page.items.len(), page.total));
                lines.join("\n")
            }))
        }
        DataCommands::Show { resource, id } => {
            let mut records = store(resource);
            let item = records.fetch_one(id).await?;
            Ok(output_value(output_format, &item, || match serde_json::to_string_pretty(&item) {
                Ok(pretty) => pretty,
                Err(_) => item.to_string(),
            }))
        }
        DataCommands::Create { resource, body } => {
            let body = match read_json_arg(body.as_deref()) {
                Ok(body) => body,
                Err(e) => return Ok(Err(e)),
            };
            let created = store(resource).create(&body).await?;
            Ok(output_success(output_format, "Record created", Some(json!({ "record": created }))))
        }
        DataCommands::Update { resource, id, body } => {
            let body = match read_json_arg(body.as_deref()) {
                Ok(body) => body,
                Err(e) => return Ok(Err(e)),
            };
            let updated = store(resource).update(id, &body).await?;
            Ok(output_success(output_format, &format!("Record {} updated", id), Some(json!({ "record": updated }))))
        }
        DataCommands::Delete { resource, id } => {
            store(resource).delete(id).await?;
            Ok(output_success(output_format, &format!("Record {} deleted", id), None))
        }
        DataCommands::Export { resource, ids, output } => {
            let ids = ids.as_deref();
            let blob = match resource {
                ResourceKind::Testcase => console.testcases().export(&id_params(ids)).await?,
                ResourceKind::Prompt => console.prompts().export(ids).await?,
                ResourceKind::Knowledge => console.knowledge().export(ids).await?,
                other => return Ok(Err(unsupported(other, "export"))),
            };
            Ok(write_download(output_format, &blob, output, &format!("{}-export.xlsx", resource.resource().label)))
        }
        DataCommands::Template { resource, output } => {
            let blob = match resource {
                ResourceKind::Testcase => console.testcases().download_template().await?,
                ResourceKind::Prompt => console.prompts().download_template().await?,
                ResourceKind::Knowledge => console.knowledge().download_template().await?,
                other => return Ok(Err(unsupported(other, "template"))),
            };
            Ok(write_download(output_format, &blob, output, &format!("{}-template.xlsx", resource.resource().label)))
        }
        DataCommands::Import { resource, input } => {
            let bytes = match fs::read(&input).with_context(|| format!("failed to read {}", input.display())) {
                Ok(bytes) => bytes,
                Err(e) => return Ok(Err(e)),
            };
            let upload = Upload::new(file_name(&input), bytes);
            let result = match resource {
                ResourceKind::Testcase => console.testcases().import(upload).await?,
                ResourceKind::Prompt => console.prompts().import(upload).await?,
                ResourceKind::Knowledge => console.knowledge().import(upload).await?,
                other => return Ok(Err(unsupported(other, "import"))),
            };
            Ok(output_success(output_format, "Import finished", Some(json!({ "result": result }))))
        }
    }
}

fn list_params(page: u32, per_page: u32, keyword: Option<String>, extra: &[String]) -> anyhow::Result<Params> {
    let mut params = Params::new();
    params.insert("page".to_string(), page.to_string());
    params.insert("per_page".to_string(), per_page.to_string());
    if let Some(keyword) = keyword {
        params.insert("keyword".to_string(), keyword);
    }
    for pair in extra {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected KEY=VALUE, got '{}'", pair))?;
        params.insert(key.to_string(), value.to_string());
    }
    Ok(params)
}

fn unsupported(kind: ResourceKind, action: &str) -> anyhow::Error {
    anyhow::anyhow!("{} does not support {}", kind.resource().label, action)
}

fn write_download(output_format: &OutputFormat, blob: &Blob, output: Option<PathBuf>, fallback: &str) -> anyhow::Result<()> {
    let path = save_blob(blob, output, fallback)?;
    output_success(
        output_format,
        &format!("Saved {} bytes to {}", blob.bytes.len(), path.display()),
        Some(json!({ "path": path, "bytes": blob.bytes.len() })),
    )
}
