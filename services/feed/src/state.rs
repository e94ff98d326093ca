//! Application state shared across handlers

use common::{jwt::JwtService, storage::BlobStorage};
use social::store::SocialStore;
use std::sync::Arc;

use crate::config::FeedConfig;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState<S: SocialStore> {
    pub store: S,
    pub storage: BlobStorage,
    pub jwt: JwtService,
    pub config: Arc<FeedConfig>,
}
