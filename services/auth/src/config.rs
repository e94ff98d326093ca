//! Auth service settings

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Settings layered from defaults and `AUTH_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Base URL used in activation and password reset links
    pub public_url: String,
    /// Sender address of outgoing mail
    pub from_email: String,
}

impl AuthConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("AUTH"))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "0.0.0.0:3000")?
            .set_default("public_url", "http://localhost:3000")?
            .set_default("from_email", "noreply@localhost")?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// `public_url` without a trailing slash
    pub fn base_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }
}
