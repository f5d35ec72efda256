use std::sync::Arc;

use auditor_api::config::AppConfig;
use auditor_api::database::{DatabaseManager, PgStore};
use auditor_api::{app, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, AUDITOR_JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("auditor_api=info,tower_http=info")),
        )
        .init();

    let config = AppConfig::from_env();
    tracing::info!("Starting Auditor API in {:?} mode", config.environment);
    if config.security.jwt_secret.is_empty() {
        if config.is_production() {
            anyhow::bail!("AUDITOR_JWT_SECRET must be set in production");
        }
        tracing::warn!("AUDITOR_JWT_SECRET is not set; every protected route will reject tokens");
    }

    // The pool connects on first use so /health can report an unreachable database
    let pool = DatabaseManager::connect_lazy(&config.database)?;
    let query_logging = config.database.enable_query_logging || config.filter.debug_logging;
    let store = Arc::new(PgStore::new(pool, query_logging));

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let state = AppState::new(config, store);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Auditor API listening on http://{}", bind_addr);

    axum::serve(listener, app(state)).await?;
    Ok(())
}
