use clap::Args;
use serde_json::Value;
use std::time::Duration;

use crate::cli::utils::{output_error, output_success};
use crate::cli::OutputFormat;

#[derive(Args)]
pub struct PingArgs {
    #[arg(long, env = "AUDITOR_API_URL", default_value = "http://localhost:3000", help = "Server base URL")]
    pub url: String,
}

/// Calls `/health` on a running server.
pub async fn handle(args: PingArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let client = reqwest::Client::builder().timeout(Duration::from_secs(5)).build()?;
    let url = format!("{}/health", args.url.trim_end_matches('/'));

    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            output_error(&output_format, &format!("{} unreachable: {}", url, e), Some("UNREACHABLE"))?;
            anyhow::bail!("server unreachable");
        }
    };

    let status = response.status();
    let body: Value = response.json().await.unwrap_or(Value::Null);
    if status.is_success() {
        output_success(&output_format, &format!("{} is healthy", args.url), body.get("data").cloned())
    } else {
        output_error(&output_format, &format!("{} answered {}", url, status), Some("UNHEALTHY"))?;
        anyhow::bail!("server unhealthy")
    }
}
