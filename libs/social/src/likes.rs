//! Like toggling

use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{SocialError, SocialResult},
    models::LikeState,
    store::SocialStore,
};

/// Flip the like of `liker` on `post_id`
///
/// At most one like exists per pair; the store's uniqueness rule decides
/// when two toggles race. Unknown posts fail with `NotFound("post")`.
pub async fn toggle_like<S: SocialStore>(
    store: &S,
    liker: Uuid,
    post_id: Uuid,
) -> SocialResult<LikeState> {
    if store.delete_like(liker, post_id).await? {
        info!("Identity {} unliked post {}", liker, post_id);
        return Ok(LikeState { liked: false });
    }

    match store.insert_like(liker, post_id).await {
        Ok(_) => {
            info!("Identity {} liked post {}", liker, post_id);
            Ok(LikeState { liked: true })
        }
        Err(SocialError::UniquenessViolation(_)) => {
            warn!(
                "Like of post {} by {} was created concurrently, keeping it",
                post_id, liker
            );
            Ok(LikeState { liked: true })
        }
        Err(e) => Err(e),
    }
}
