//! Follow graph toggling and reads
//!
//! Every identity holds an edge to itself from provisioning. Reads and
//! counts never show it, and it cannot be toggled.

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{SocialError, SocialResult},
    models::{FollowState, IdentitySummary},
    pagination::{PageRequest, Paginated},
    store::SocialStore,
};

/// Flip the edge `viewer -> target`
///
/// The delete and the insert each rely on the store's uniqueness rule, so a
/// concurrent toggle that created the edge first is reported as following.
pub async fn toggle_follow<S: SocialStore>(
    store: &S,
    viewer: Uuid,
    target: Uuid,
) -> SocialResult<FollowState> {
    if viewer == target {
        return Err(SocialError::SelfFollow);
    }

    if store.delete_follow(viewer, target).await? {
        info!("Identity {} unfollowed {}", viewer, target);
        return Ok(FollowState { following: false });
    }

    match store.insert_follow(viewer, target).await {
        Ok(_) => {
            info!("Identity {} followed {}", viewer, target);
            Ok(FollowState { following: true })
        }
        Err(SocialError::UniquenessViolation(_)) => {
            warn!(
                "Follow {} -> {} was created concurrently, keeping it",
                viewer, target
            );
            Ok(FollowState { following: true })
        }
        Err(e) => Err(e),
    }
}

/// Identities following `id`
pub async fn followers_of<S: SocialStore>(
    store: &S,
    id: Uuid,
    page: PageRequest,
) -> SocialResult<Paginated<IdentitySummary>> {
    let (items, total) = store.list_followers(id, page).await?;
    Ok(Paginated::new(items, page, total))
}

/// Identities `id` follows
pub async fn followings_of<S: SocialStore>(
    store: &S,
    id: Uuid,
    page: PageRequest,
) -> SocialResult<Paginated<IdentitySummary>> {
    let (items, total) = store.list_followings(id, page).await?;
    Ok(Paginated::new(items, page, total))
}

/// Whether `viewer` follows `target`; always false for oneself
pub async fn is_following<S: SocialStore>(
    store: &S,
    viewer: Uuid,
    target: Uuid,
) -> SocialResult<bool> {
    if viewer == target {
        return Ok(false);
    }
    store.follow_exists(viewer, target).await
}
