pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "auditor")]
#[command(about = "Auditor CLI - schema setup, access tokens and health checks for the Auditor API")]
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
    #[command(about = "Prepare the database")]
    Init {
        #[command(subcommand)]
        cmd: commands::init::InitCommands,
    },

    #[command(about = "Issue an access token for a user")]
    Token(commands::token::TokenArgs),

    #[command(about = "Check a running server's /health endpoint")]
    Ping(commands::ping::PingArgs),
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

    match cli.command {
        Commands::Init { cmd } => commands::init::handle(cmd, output_format).await,
        Commands::Token(args) => commands::token::handle(args, output_format).await,
        Commands::Ping(args) => commands::ping::handle(args, output_format).await,
    }
}
