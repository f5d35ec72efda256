use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::filter::FilterError;

/// Errors from the storage layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error("Invalid database name: {0}")]
    InvalidDatabaseName(String),

    #[error("Unknown field '{field}' on {collection}")]
    UnknownField { collection: &'static str, field: String },

    #[error("Malformed document: {0}")]
    Decode(String),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Constraint (or column) name when the error is a unique-key violation.
    pub fn duplicate_key(&self) -> Option<String> {
        match self {
            DatabaseError::Sqlx(sqlx::Error::Database(db)) if db.code().as_deref() == Some("23505") => {
                Some(db.constraint().unwrap_or("unique").to_string())
            }
            _ => None,
        }
    }

    /// True when Postgres rejected a value that cannot be cast to the column
    /// type, such as a malformed UUID.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            DatabaseError::Sqlx(sqlx::Error::Database(db)) if db.code().as_deref() == Some("22P02")
        )
    }
}

/// Builds the Postgres pool from configuration.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Create a pool that opens connections on first use, so the server can
    /// start (and answer /health) while the database is still unavailable.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(&config.url, config.name.as_deref())?;
        let pool = Self::pool_options(config).connect_lazy(&connection_string)?;
        info!("Configured lazy database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Create a pool and open the first connection immediately.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(&config.url, config.name.as_deref())?;
        let pool = Self::pool_options(config).connect(&connection_string).await?;
        info!("Connected database pool");
        Ok(pool)
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
    }

    fn build_connection_string(base: &str, database_name: Option<&str>) -> Result<String, DatabaseError> {
        let mut url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        if let Some(name) = database_name {
            if !Self::is_valid_db_name(name) {
                return Err(DatabaseError::InvalidDatabaseName(name.to_string()));
            }
            // Replace the path to the database name (ensure leading slash)
            url.set_path(&format!("/{}", name));
        }
        Ok(url.into())
    }

    /// Validate database names to prevent injection: a letter or underscore
    /// followed by [a-zA-Z0-9_], at most 63 bytes.
    fn is_valid_db_name(name: &str) -> bool {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        valid_start && name.len() <= 63 && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    }
}
