use anyhow::Context;
use tracing_subscriber::EnvFilter;

use cohort_api::config::{config, AppConfig};
use cohort_api::database::DatabaseManager;
use cohort_api::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cohort_api=info,tower_http=info")),
        )
        .init();

    let config: AppConfig = config().clone();
    config
        .check()
        .map_err(anyhow::Error::msg)
        .context("refusing to start with this configuration")?;
    tracing::info!("Starting Cohort API in {:?} mode", config.environment);

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("failed to open database")?;
    DatabaseManager::migrate(&pool)
        .await
        .context("failed to apply migrations")?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Cohort API listening on http://{}", bind_addr);

    axum::serve(listener, app(AppState::new(pool, config))).await?;
    Ok(())
}
