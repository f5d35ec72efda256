use clap::Subcommand;
use serde_json::json;
use sqlx::Executor;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::DatabaseManager;

/// Table definitions matching `database::Collection`.
pub const SCHEMA_SQL: &str = include_str!("../../../sql/schema.sql");

#[derive(Subcommand)]
pub enum InitCommands {
    #[command(about = "Create the tables in the configured database (idempotent)")]
    Schema,
}

pub async fn handle(cmd: InitCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        InitCommands::Schema => {
            let config = AppConfig::from_env();
            let pool = DatabaseManager::connect(&config.database).await?;
            // Unparameterized text runs over the simple protocol, which accepts
            // several statements at once
            pool.execute(SCHEMA_SQL).await?;
            output_success(
                &output_format,
                "Schema applied",
                Some(json!({ "database": config.database.name.unwrap_or_else(|| "default".to_string()) })),
            )
        }
    }
}
