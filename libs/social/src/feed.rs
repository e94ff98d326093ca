//! Feed composition

use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::{
    error::SocialResult,
    models::{IdentitySummary, PostView},
    pagination::PageRequest,
    store::SocialStore,
};

/// A viewer's feed page
#[derive(Debug, Clone, Serialize)]
pub struct Feed {
    pub posts: Vec<PostView>,
    /// Posts of this page the viewer has liked
    pub liked_post_ids: BTreeSet<Uuid>,
    /// Everyone but the viewer, offered when there is nothing to show
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<IdentitySummary>>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

/// Posts of everyone the viewer follows, newest first
///
/// The self edge puts the viewer's own posts in the feed.
pub async fn compose_feed<S: SocialStore>(
    store: &S,
    viewer: Uuid,
    page: PageRequest,
) -> SocialResult<Feed> {
    let followed = store.followed_ids(viewer).await?;
    let (posts, total) = store.posts_by_authors(&followed, page).await?;

    let post_ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();
    let liked_post_ids = store
        .liked_post_ids(viewer, &post_ids)
        .await?
        .into_iter()
        .collect();

    let suggestions = if total == 0 {
        Some(store.list_identities_except(viewer).await?)
    } else {
        None
    };

    Ok(Feed {
        posts,
        liked_post_ids,
        suggestions,
        page: page.page,
        limit: page.limit,
        total,
    })
}
