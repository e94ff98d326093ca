//! Feed service settings

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Settings layered from defaults and `FEED_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Largest accepted request body, uploads included
    pub max_upload_bytes: usize,
    /// Photos accepted per post
    pub max_photos_per_post: usize,
}

impl FeedConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix("FEED"))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("bind_addr", "0.0.0.0:3001")?
            .set_default("max_upload_bytes", 10 * 1024 * 1024_i64)?
            .set_default("max_photos_per_post", 10_i64)?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3001".to_string(),
            max_upload_bytes: 10 * 1024 * 1024,
            max_photos_per_post: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn environment(vars: &[(&str, &str)]) -> Environment {
        let mut source = ::config::Map::new();
        for (key, value) in vars {
            source.insert(key.to_string(), value.to_string());
        }
        Environment::with_prefix("FEED").source(Some(source))
    }

    #[test]
    fn test_defaults() {
        let config = FeedConfig::from_environment(environment(&[])).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:3001");
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_photos_per_post, 10);
    }

    #[test]
    fn test_environment_overrides() {
        let config = FeedConfig::from_environment(environment(&[
            ("FEED_BIND_ADDR", "127.0.0.1:8080"),
            ("FEED_MAX_PHOTOS_PER_POST", "3"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.max_photos_per_post, 3);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_number_is_an_error() {
        let result =
            FeedConfig::from_environment(environment(&[("FEED_MAX_PHOTOS_PER_POST", "many")]));
        assert!(result.is_err());
    }
}
