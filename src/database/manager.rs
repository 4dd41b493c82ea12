use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the database layer
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("Record not found".to_string()),
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                DatabaseError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                DatabaseError::ForeignKey(db_err.message().to_string())
            }
            other => DatabaseError::Sqlx(other),
        }
    }
}

/// Opens pools and keeps the schema current
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open a pool for the configured database URL, creating the file if needed
    pub async fn connect(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(options)
            .await?;

        info!("Created database pool for: {}", config.url);
        Ok(pool)
    }

    /// Private in-memory database. Every connection to `:memory:` is a new
    /// database, so the pool is pinned to one long-lived connection.
    pub async fn connect_in_memory() -> Result<SqlitePool, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Ok(pool)
    }

    /// Apply pending migrations from `migrations/`
    pub async fn migrate(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database migrations applied");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &SqlitePool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }
}
