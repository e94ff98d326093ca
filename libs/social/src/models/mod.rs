//! Social feed models

pub mod follow;
pub mod identity;
pub mod like;
pub mod post;
pub mod profile;

// Re-export for convenience
pub use follow::{FollowEdge, FollowState};
pub use identity::{Identity, IdentitySummary, NewIdentity, Provisioned};
pub use like::{Like, LikeState};
pub use post::{Photo, Post, PostView, Upload};
pub use profile::{DEFAULT_AVATAR, Profile, ProfileChanges, ProfileView};
