//! Identity model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::{FollowEdge, Profile};

/// Account entity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New identity creation payload; the password is already hashed
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// Everything created together with an identity
#[derive(Debug, Clone)]
pub struct Provisioned {
    pub identity: Identity,
    pub profile: Profile,
    pub self_edge: FollowEdge,
}

/// Public view of an identity used in lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct IdentitySummary {
    pub id: Uuid,
    pub username: String,
    pub slug: String,
    pub full_name: String,
    pub avatar: String,
}
