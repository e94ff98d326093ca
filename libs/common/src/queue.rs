//! Mail job queue
//!
//! Jobs are pushed onto a Redis list by the web services and popped by the
//! mail worker. An in-process channel backend is available for single-process
//! setups and tests.

use redis::{AsyncCommands, Client};
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::{error::QueueError, mail::OutgoingMail};

/// Configuration for the Redis connection
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    pub url: String,
    /// Name of the list holding pending mail jobs
    pub queue_key: String,
}

impl RedisConfig {
    /// Create a new RedisConfig from environment variables
    ///
    /// # Environment Variables
    /// - `REDIS_URL`: Redis connection URL (default: "redis://localhost:6379")
    /// - `MAIL_QUEUE_KEY`: List key for mail jobs (default: "social_feed:mail")
    pub fn from_env() -> Self {
        let url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
        let queue_key =
            std::env::var("MAIL_QUEUE_KEY").unwrap_or_else(|_| "social_feed:mail".to_string());

        RedisConfig { url, queue_key }
    }
}

/// Redis-backed job queue
#[derive(Clone)]
pub struct RedisQueue {
    client: Client,
    queue_key: String,
}

impl RedisQueue {
    /// Open a client for the configured Redis instance
    pub fn new(config: &RedisConfig) -> Result<Self, QueueError> {
        let client = Client::open(config.url.clone())?;
        info!("Redis client initialized with URL: {}", config.url);
        Ok(RedisQueue {
            client,
            queue_key: config.queue_key.clone(),
        })
    }

    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, QueueError> {
        let conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn)
    }

    /// Push a mail job onto the queue
    pub async fn push(&self, mail: &OutgoingMail) -> Result<(), QueueError> {
        let payload = serde_json::to_string(mail)?;
        let mut conn = self.get_connection().await?;
        let _: i64 = conn.lpush(&self.queue_key, payload).await?;
        Ok(())
    }

    /// Wait up to `timeout_seconds` for the next job
    ///
    /// Returns `None` when the timeout elapses without a job.
    pub async fn pop(&self, timeout_seconds: u64) -> Result<Option<OutgoingMail>, QueueError> {
        let mut conn = self.get_connection().await?;
        let popped: Option<(String, String)> = redis::cmd("BRPOP")
            .arg(&self.queue_key)
            .arg(timeout_seconds)
            .query_async(&mut conn)
            .await?;

        match popped {
            Some((_, payload)) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Check if Redis is reachable
    pub async fn health_check(&self) -> Result<bool, QueueError> {
        let mut conn = self.get_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong == "PONG")
    }
}

/// Producer side of the mail queue
#[derive(Clone)]
pub enum MailQueue {
    /// Jobs go to Redis and are delivered by the mail worker
    Redis(RedisQueue),
    /// Jobs go to a consumer in the same process
    InProcess(UnboundedSender<OutgoingMail>),
}

impl MailQueue {
    /// Hand a mail over for asynchronous delivery
    pub async fn enqueue(&self, mail: OutgoingMail) -> Result<(), QueueError> {
        info!("Enqueueing {:?} mail for {}", mail.kind, mail.to);
        match self {
            MailQueue::Redis(queue) => queue.push(&mail).await,
            MailQueue::InProcess(sender) => sender.send(mail).map_err(|_| QueueError::Closed),
        }
    }
}
