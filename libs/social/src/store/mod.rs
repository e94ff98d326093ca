//! Persistence for the social model
//!
//! Uniqueness rules (username, email, slug, follow pair, like pair) are
//! enforced by the store itself. Inserts that would break one fail with
//! [`SocialError::UniquenessViolation`](crate::SocialError::UniquenessViolation)
//! (or the duplicate username/email variants) so callers can rely on the
//! failed insert instead of an existence check.

use std::future::Future;
use uuid::Uuid;

use crate::{
    error::SocialResult,
    models::{
        FollowEdge, Identity, IdentitySummary, Like, NewIdentity, Photo, Post, PostView, Profile,
        ProfileChanges, Provisioned,
    },
    pagination::PageRequest,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Storage operations required by the core
pub trait SocialStore: Clone + Send + Sync + 'static {
    /// Insert an identity together with its profile and self follow edge,
    /// atomically. The profile slug is derived from the username and made
    /// unique.
    fn create_identity(
        &self,
        new_identity: NewIdentity,
    ) -> impl Future<Output = SocialResult<Provisioned>> + Send;

    fn find_identity_by_id(
        &self,
        id: Uuid,
    ) -> impl Future<Output = SocialResult<Option<Identity>>> + Send;

    fn find_identity_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = SocialResult<Option<Identity>>> + Send;

    fn find_identity_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = SocialResult<Option<Identity>>> + Send;

    /// Returns false when the identity does not exist
    fn activate_identity(&self, id: Uuid) -> impl Future<Output = SocialResult<bool>> + Send;

    /// Returns false when the identity does not exist
    fn set_password_hash(
        &self,
        id: Uuid,
        password_hash: &str,
    ) -> impl Future<Output = SocialResult<bool>> + Send;

    /// Every identity but `id`, ordered by username
    fn list_identities_except(
        &self,
        id: Uuid,
    ) -> impl Future<Output = SocialResult<Vec<IdentitySummary>>> + Send;

    fn find_profile_by_slug(
        &self,
        slug: &str,
    ) -> impl Future<Output = SocialResult<Option<Profile>>> + Send;

    fn find_profile_by_owner(
        &self,
        owner_id: Uuid,
    ) -> impl Future<Output = SocialResult<Option<Profile>>> + Send;

    /// Apply `changes` to the owner's profile; the slug is never touched
    fn update_profile(
        &self,
        owner_id: Uuid,
        changes: ProfileChanges,
    ) -> impl Future<Output = SocialResult<Profile>> + Send;

    /// Create the edge `follower -> following`
    fn insert_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> impl Future<Output = SocialResult<FollowEdge>> + Send;

    /// Delete the edge `follower -> following`; false when there was none
    fn delete_follow(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> impl Future<Output = SocialResult<bool>> + Send;

    fn follow_exists(
        &self,
        follower_id: Uuid,
        following_id: Uuid,
    ) -> impl Future<Output = SocialResult<bool>> + Send;

    /// Targets of every edge leaving `follower_id`, the self edge included
    fn followed_ids(
        &self,
        follower_id: Uuid,
    ) -> impl Future<Output = SocialResult<Vec<Uuid>>> + Send;

    /// Identities following `id`, newest edge first, self edge excluded
    fn list_followers(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> impl Future<Output = SocialResult<(Vec<IdentitySummary>, i64)>> + Send;

    /// Identities `id` follows, newest edge first, self edge excluded
    fn list_followings(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> impl Future<Output = SocialResult<(Vec<IdentitySummary>, i64)>> + Send;

    /// (followers, followings) of `id`, self edge excluded
    fn follow_counts(&self, id: Uuid) -> impl Future<Output = SocialResult<(i64, i64)>> + Send;

    fn insert_post(
        &self,
        author_id: Uuid,
        text: &str,
    ) -> impl Future<Output = SocialResult<Post>> + Send;

    fn insert_photo(
        &self,
        post_id: Uuid,
        uploader_id: Uuid,
        image: &str,
    ) -> impl Future<Output = SocialResult<Photo>> + Send;

    /// Delete a post with its photos and likes; false when there was none
    fn delete_post(&self, post_id: Uuid) -> impl Future<Output = SocialResult<bool>> + Send;

    fn find_post(
        &self,
        post_id: Uuid,
    ) -> impl Future<Output = SocialResult<Option<PostView>>> + Send;

    /// Posts by any of `author_ids`, newest first, with the total count
    fn posts_by_authors(
        &self,
        author_ids: &[Uuid],
        page: PageRequest,
    ) -> impl Future<Output = SocialResult<(Vec<PostView>, i64)>> + Send;

    /// Create the like; `NotFound("post")` when the post does not exist
    fn insert_like(
        &self,
        liker_id: Uuid,
        post_id: Uuid,
    ) -> impl Future<Output = SocialResult<Like>> + Send;

    /// Delete the like; false when there was none
    fn delete_like(
        &self,
        liker_id: Uuid,
        post_id: Uuid,
    ) -> impl Future<Output = SocialResult<bool>> + Send;

    /// Which of `post_ids` the liker has liked
    fn liked_post_ids(
        &self,
        liker_id: Uuid,
        post_ids: &[Uuid],
    ) -> impl Future<Output = SocialResult<Vec<Uuid>>> + Send;
}
