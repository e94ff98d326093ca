use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod config;
mod emails;
mod error;
mod rate_limiter;
mod routes;
mod state;

use common::{
    database::{DatabaseConfig, health_check, init_pool},
    jwt::{JwtConfig, JwtService},
    queue::{MailQueue, RedisConfig, RedisQueue},
};
use social::store::PgStore;

use crate::{
    config::AuthConfig,
    rate_limiter::{RateLimiter, RateLimiterConfig},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    info!("Starting authentication service");

    let config = AuthConfig::load().context("Invalid auth service configuration")?;

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

    // Initialize JWT service
    let jwt = JwtService::new(JwtConfig::from_env()?)?;
    if !jwt.can_sign() {
        anyhow::bail!("The auth service needs JWT_SECRET or JWT_PRIVATE_KEY to issue tokens");
    }

    // Initialize the mail queue
    let redis_config = RedisConfig::from_env();
    let queue = RedisQueue::new(&redis_config)?;
    if !queue.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    info!("Authentication service initialized successfully");

    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        store,
        jwt,
        mail: MailQueue::Redis(queue),
        rate_limiter: RateLimiter::new(RateLimiterConfig::default()),
        config: Arc::new(config),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Authentication service listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
