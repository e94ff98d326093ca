//! Post creation and detail

use common::storage::BlobStorage;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{SocialError, SocialResult},
    models::PostView,
    store::SocialStore,
    validation::PostForm,
};

/// A post as seen by a viewer
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    pub liked: bool,
}

/// Create a post from an already cleaned form
///
/// The post row is written first and the photos attached to it. A post that
/// ends up with neither text nor photos is deleted again and `None` is
/// returned. When a photo cannot be stored the post is deleted and the
/// storage error returned.
pub async fn create_post<S: SocialStore>(
    store: &S,
    storage: &BlobStorage,
    author: Uuid,
    form: PostForm,
) -> SocialResult<Option<PostView>> {
    let post = store.insert_post(author, &form.text).await?;
    let mut references = Vec::with_capacity(form.photos.len());

    for upload in form.photos {
        let path = format!("photos/{}/{}.{}", post.id, Uuid::new_v4(), upload.extension());
        let reference = match storage.put(&path, upload.bytes, &upload.content_type).await {
            Ok(reference) => reference,
            Err(e) => {
                error!("Failed to store photo for post {}: {}", post.id, e);
                discard(store, post.id, &references).await;
                return Err(SocialError::Storage(e));
            }
        };

        let inserted = store.insert_photo(post.id, author, &reference).await;
        references.push(reference);
        if let Err(e) = inserted {
            discard(store, post.id, &references).await;
            return Err(e);
        }
    }

    if post.text.is_empty() && references.is_empty() {
        store.delete_post(post.id).await?;
        info!("Discarded empty post {} by {}", post.id, author);
        return Ok(None);
    }

    info!(
        "Post {} created by {} with {} photos",
        post.id,
        author,
        references.len()
    );
    store
        .find_post(post.id)
        .await?
        .ok_or(SocialError::NotFound("post"))
        .map(Some)
}

async fn discard<S: SocialStore>(store: &S, post_id: Uuid, orphaned: &[String]) {
    if let Err(e) = store.delete_post(post_id).await {
        error!("Failed to delete post {} after a failed upload: {}", post_id, e);
    }
    for reference in orphaned {
        warn!("Blob {} orphaned by discarded post {}", reference, post_id);
    }
}

/// Post detail with the viewer's like state
pub async fn get_post<S: SocialStore>(
    store: &S,
    viewer: Uuid,
    post_id: Uuid,
) -> SocialResult<PostDetail> {
    let post = store
        .find_post(post_id)
        .await?
        .ok_or(SocialError::NotFound("post"))?;
    let liked = !store.liked_post_ids(viewer, &[post_id]).await?.is_empty();

    Ok(PostDetail { post, liked })
}
