use anyhow::Context;
use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Role};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::AppConfig;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(long, help = "User id the token is issued for")]
    pub user: Uuid,

    #[arg(long, default_value_t = 2, help = "Role code: 1 admin, 2 user")]
    pub role: u8,
}

/// Signs an access token with the configured secret.
pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let role = Role::try_from(args.role).map_err(anyhow::Error::msg)?;
    if role == Role::Anonymous {
        anyhow::bail!("role 0 cannot be issued a token");
    }

    let config = AppConfig::from_env();
    let token = generate_jwt(&config.security, args.user, role).context("failed to sign token")?;

    match output_format {
        OutputFormat::Text => {
            println!("{}", token);
            Ok(())
        }
        OutputFormat::Json => output_success(
            &output_format,
            "Token issued",
            Some(json!({ "token": token, "user": args.user, "role": role.code() })),
        ),
    }
}
