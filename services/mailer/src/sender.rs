//! Mail delivery backends

use common::mail::OutgoingMail;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("Relay request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay rejected the mail with status {0}")]
    Rejected(StatusCode),
}

/// Where mail ends up
#[derive(Debug, Clone)]
pub enum MailSender {
    /// POST the mail as JSON to an HTTP relay
    Relay { client: Client, url: String },
    /// Only log that the mail would have been sent
    Log,
}

impl MailSender {
    /// Create a sender from environment variables
    ///
    /// # Environment Variables
    /// - `MAIL_RELAY_URL`: HTTP relay endpoint; mail is only logged when unset
    pub fn from_env() -> Self {
        match std::env::var("MAIL_RELAY_URL") {
            Ok(url) if !url.is_empty() => {
                info!("Delivering mail through relay {}", url);
                MailSender::Relay {
                    client: Client::new(),
                    url,
                }
            }
            _ => {
                info!("MAIL_RELAY_URL not set, mail will only be logged");
                MailSender::Log
            }
        }
    }

    pub async fn send(&self, mail: &OutgoingMail) -> Result<(), DeliveryError> {
        match self {
            MailSender::Relay { client, url } => {
                let response = client.post(url).json(mail).send().await?;
                if !response.status().is_success() {
                    return Err(DeliveryError::Rejected(response.status()));
                }
                Ok(())
            }
            MailSender::Log => {
                info!(
                    "Mail ({:?}) to {} from {}: {}",
                    mail.kind, mail.to, mail.from, mail.subject
                );
                Ok(())
            }
        }
    }
}
