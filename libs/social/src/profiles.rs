//! Profile pages and updates

use common::storage::BlobStorage;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{SocialError, SocialResult},
    follow_graph::is_following,
    models::{Profile, ProfileChanges, ProfileView},
    store::SocialStore,
    validation::ProfileForm,
};

/// Profile with the given slug
pub async fn find_by_slug<S: SocialStore>(store: &S, slug: &str) -> SocialResult<Profile> {
    store
        .find_profile_by_slug(slug)
        .await?
        .ok_or(SocialError::NotFound("profile"))
}

/// Profile page as seen by `viewer`
pub async fn view_profile<S: SocialStore>(
    store: &S,
    viewer: Uuid,
    slug: &str,
) -> SocialResult<ProfileView> {
    let profile = find_by_slug(store, slug).await?;
    let owner = store
        .find_identity_by_id(profile.owner_id)
        .await?
        .ok_or(SocialError::NotFound("identity"))?;
    let (followers_count, followings_count) = store.follow_counts(owner.id).await?;
    let is_following = is_following(store, viewer, owner.id).await?;

    Ok(ProfileView {
        profile,
        username: owner.username,
        followers_count,
        followings_count,
        is_following,
        is_self: viewer == owner.id,
    })
}

/// Apply a cleaned profile form to the owner's profile
///
/// The avatar, when present, is stored first. The slug never changes.
pub async fn update_profile<S: SocialStore>(
    store: &S,
    storage: &BlobStorage,
    owner_id: Uuid,
    form: ProfileForm,
) -> SocialResult<Profile> {
    let avatar = match form.avatar {
        Some(upload) => {
            let path = format!(
                "avatars/{}/{}.{}",
                owner_id,
                Uuid::new_v4(),
                upload.extension()
            );
            Some(storage.put(&path, upload.bytes, &upload.content_type).await?)
        }
        None => None,
    };

    let changes = ProfileChanges {
        full_name: form.full_name,
        bio: form.bio,
        avatar: avatar.clone(),
    };

    match store.update_profile(owner_id, changes).await {
        Ok(profile) => {
            info!("Profile {} updated", profile.slug);
            Ok(profile)
        }
        Err(e) => {
            if let Some(reference) = avatar {
                warn!("Avatar {} orphaned by a failed profile update", reference);
            }
            Err(e)
        }
    }
}
