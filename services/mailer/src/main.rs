use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod sender;
mod worker;

use common::queue::{RedisConfig, RedisQueue};
use sender::MailSender;
use worker::WorkerConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting mail worker");

    let redis_config = RedisConfig::from_env();
    let queue = RedisQueue::new(&redis_config)?;
    if !queue.health_check().await? {
        anyhow::bail!("Failed to connect to Redis");
    }

    let sender = MailSender::from_env();
    let config = WorkerConfig::from_env();

    info!(
        "Mail worker consuming {} with up to {} attempts per mail",
        redis_config.queue_key, config.max_retries
    );

    worker::run(&queue, &sender, &config, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
    })
    .await;

    info!("Mail worker stopped");
    Ok(())
}
