//! Follow graph edges

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Directed edge `follower -> following`, unique per ordered pair
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct FollowEdge {
    pub id: Uuid,
    pub follower_id: Uuid,
    pub following_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl FollowEdge {
    /// The edge every identity holds to itself
    pub fn is_self_edge(&self) -> bool {
        self.follower_id == self.following_id
    }
}

/// Result of a follow toggle
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct FollowState {
    pub following: bool,
}
