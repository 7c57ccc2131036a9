pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use crate::config::config;
use crate::console::Console;

#[derive(Parser)]
#[command(name = "tcg")]
#[command(about = "TestCase Generator console - session, permissions, routes and resource data")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Authentication and token management")]
    Auth {
        #[command(subcommand)]
        cmd: commands::auth::AuthCommands,
    },

    #[command(about = "Navigate to a console path through the route guard")]
    Nav {
        #[arg(help = "Target path, e.g. /testing/testcases?page=2")]
        path: String,
    },

    #[command(about = "Inspect and compile console routes")]
    Routes {
        #[command(subcommand)]
        cmd: commands::routes::RoutesCommands,
    },

    #[command(about = "Permission codes of the signed-in user")]
    Perm {
        #[command(subcommand)]
        cmd: commands::perm::PermCommands,
    },

    #[command(about = "Resource data operations")]
    Data {
        #[command(subcommand)]
        cmd: commands::data::DataCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    // offline command, no session needed
    if let Commands::Routes {
        cmd: commands::routes::RoutesCommands::Compile { file },
    } = &cli.command
    {
        return commands::routes::compile(file, output_format);
    }

    let mut console = Console::from_config(config())?;

    match cli.command {
        Commands::Auth { cmd } => commands::auth::handle(cmd, &mut console, output_format).await,
        Commands::Nav { path } => commands::nav::handle(&path, &mut console, output_format).await,
        Commands::Routes { cmd } => commands::routes::handle(cmd, &mut console, output_format).await,
        Commands::Perm { cmd } => commands::perm::handle(cmd, &mut console, output_format).await,
        Commands::Data { cmd } => commands::data::handle(cmd, &mut console, output_format).await,
    }
}
