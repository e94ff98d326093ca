//! Mail queue consumer

use common::{error::QueueError, mail::OutgoingMail, queue::RedisQueue};
use std::{future::Future, time::Duration};
use tokio::time::sleep;
use tracing::{error, info};

use crate::sender::MailSender;

/// Seconds a single BRPOP waits before the loop checks for shutdown again
const POP_TIMEOUT_SECONDS: u64 = 5;

/// Where the worker takes mails from
pub trait MailSource {
    /// Wait up to `timeout_seconds` for the next mail
    fn next_mail(
        &self,
        timeout_seconds: u64,
    ) -> impl Future<Output = Result<Option<OutgoingMail>, QueueError>>;
}

impl MailSource for RedisQueue {
    async fn next_mail(&self, timeout_seconds: u64) -> Result<Option<OutgoingMail>, QueueError> {
        self.pop(timeout_seconds).await
    }
}

/// Worker settings
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Delivery attempts per mail
    pub max_retries: u32,
    /// Delay after the first failed attempt; doubled after each further one
    pub base_delay: Duration,
}

impl WorkerConfig {
    /// Create a new WorkerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `MAIL_MAX_RETRIES`: Delivery attempts per mail (default: 3)
    pub fn from_env() -> Self {
        let max_retries = std::env::var("MAIL_MAX_RETRIES")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|retries| *retries > 0)
            .unwrap_or(3);

        Self {
            max_retries,
            base_delay: Duration::from_secs(1),
        }
    }
}

/// Delay before attempt `attempt + 1`: 1x, 2x, 4x, ... the base delay
pub fn backoff(base_delay: Duration, attempt: u32) -> Duration {
    base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
}

/// Try to deliver `mail`, retrying with exponential backoff
///
/// Returns false when every attempt failed; the mail is then dropped.
pub async fn deliver(sender: &MailSender, mail: &OutgoingMail, config: &WorkerConfig) -> bool {
    let mut attempt = 0;

    while attempt < config.max_retries {
        match sender.send(mail).await {
            Ok(()) => {
                info!("Delivered {:?} mail to {}", mail.kind, mail.to);
                return true;
            }
            Err(e) => {
                attempt += 1;
                error!(
                    "Failed to deliver mail to {} (attempt {}/{}): {}",
                    mail.to, attempt, config.max_retries, e
                );
                if attempt < config.max_retries {
                    sleep(backoff(config.base_delay, attempt)).await;
                }
            }
        }
    }

    error!(
        "Dropping mail to {} after {} attempts",
        mail.to, config.max_retries
    );
    false
}

async fn handle(
    popped: Result<Option<OutgoingMail>, QueueError>,
    sender: &MailSender,
    config: &WorkerConfig,
) {
    match popped {
        Ok(Some(mail)) => {
            deliver(sender, &mail, config).await;
        }
        Ok(None) => {}
        Err(e) => {
            error!("Failed to read the mail queue: {}", e);
            sleep(config.base_delay).await;
        }
    }
}

/// Consume the queue until `shutdown` completes
///
/// A read in flight when `shutdown` completes is finished and its mail
/// delivered, since the queue has already handed it over.
pub async fn run(
    source: &impl MailSource,
    sender: &MailSender,
    config: &WorkerConfig,
    shutdown: impl Future<Output = ()>,
) {
    tokio::pin!(shutdown);

    loop {
        let pending = source.next_mail(POP_TIMEOUT_SECONDS);
        tokio::pin!(pending);

        let read = tokio::select! {
            popped = &mut pending => Some(popped),
            _ = &mut shutdown => None,
        };

        match read {
            Some(popped) => handle(popped, sender, config).await,
            None => {
                info!("Mail worker stopping after the pending read");
                handle(pending.await, sender, config).await;
                break;
            }
        }
    }
}
