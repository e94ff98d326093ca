use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod error;
mod forms;
mod middleware;
mod routes;
mod state;

use common::{
    database::{DatabaseConfig, health_check, init_pool},
    jwt::{JwtConfig, JwtService},
    storage::{BlobStorage, StorageConfig},
};
use social::store::PgStore;

use crate::{config::FeedConfig, state::AppState};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting feed service");

    let config = FeedConfig::load().context("Invalid feed service configuration")?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    let store = PgStore::new(pool);
    store.migrate().await?;

    let storage = BlobStorage::from_config(&StorageConfig::from_env()?).await;
    let jwt = JwtService::new(JwtConfig::from_env()?)?;

    info!("Feed service initialized successfully");

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        store,
        storage,
        jwt,
        config: Arc::new(config),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Feed service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
