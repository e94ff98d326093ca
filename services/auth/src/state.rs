//! Application state shared across handlers

use common::{jwt::JwtService, queue::MailQueue};
use social::store::SocialStore;
use std::sync::Arc;

use crate::{config::AuthConfig, rate_limiter::RateLimiter};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S: SocialStore> {
    pub store: S,
    pub jwt: JwtService,
    pub mail: MailQueue,
    pub rate_limiter: RateLimiter,
    pub config: Arc<AuthConfig>,
}
