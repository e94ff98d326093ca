//! Profile model and related functionality

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Avatar reference used until the owner uploads one
pub const DEFAULT_AVATAR: &str = "blank_profile_img.png";

/// Public-facing attributes of an identity
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Profile {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub full_name: String,
    pub avatar: String,
    pub bio: String,
    /// Assigned at provisioning, never changed afterwards
    pub slug: String,
}

/// Profile update payload; `None` leaves the field as it is
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

/// Profile page as seen by a viewer
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(flatten)]
    pub profile: Profile,
    pub username: String,
    pub followers_count: i64,
    pub followings_count: i64,
    pub is_following: bool,
    pub is_self: bool,
}
