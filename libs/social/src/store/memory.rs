//! In-process implementation of the social store
//!
//! Keeps every table in a vector behind one async mutex. Vector order is
//! insertion order and breaks ties between equal timestamps.

use chrono::Utc;
use std::{cmp::Reverse, collections::HashSet, sync::Arc};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::SocialStore;
use crate::{
    error::{SocialError, SocialResult},
    models::{
        DEFAULT_AVATAR, FollowEdge, Identity, IdentitySummary, Like, NewIdentity, Photo, Post,
        PostView, Profile, ProfileChanges, Provisioned,
    },
    pagination::PageRequest,
    slug::{slugify, unique_slug},
};

#[derive(Debug, Default)]
struct Tables {
    identities: Vec<Identity>,
    profiles: Vec<Profile>,
    follows: Vec<FollowEdge>,
    posts: Vec<Post>,
    photos: Vec<Photo>,
    likes: Vec<Like>,
    /// Makes the next follow or like insert lose a race against a
    /// concurrent request creating the same row
    #[cfg(test)]
    concurrent_insert: bool,
}

impl Tables {
    fn identity_exists(&self, id: Uuid) -> bool {
        self.identities.iter().any(|identity| identity.id == id)
    }

    fn summary(&self, id: Uuid) -> SocialResult<IdentitySummary> {
        let identity = self
            .identities
            .iter()
            .find(|identity| identity.id == id)
            .ok_or(SocialError::NotFound("identity"))?;
        let profile = self
            .profiles
            .iter()
            .find(|profile| profile.owner_id == id)
            .ok_or(SocialError::NotFound("profile"))?;

        Ok(IdentitySummary {
            id,
            username: identity.username.clone(),
            slug: profile.slug.clone(),
            full_name: profile.full_name.clone(),
            avatar: profile.avatar.clone(),
        })
    }

    fn post_view(&self, post: &Post) -> SocialResult<PostView> {
        Ok(PostView {
            id: post.id,
            author: self.summary(post.author_id)?,
            text: post.text.clone(),
            created_at: post.created_at,
            photos: self
                .photos
                .iter()
                .filter(|photo| photo.post_id == post.id)
                .cloned()
                .collect(),
            likes_count: self.likes.iter().filter(|like| like.post_id == post.id).count() as i64,
        })
    }

    /// Non-self edges matching `select`, newest first, mapped to `pick`
    fn edge_page(
        &self,
        page: PageRequest,
        select: impl Fn(&FollowEdge) -> bool,
        pick: impl Fn(&FollowEdge) -> Uuid,
    ) -> SocialResult<(Vec<IdentitySummary>, i64)> {
        let mut edges: Vec<(usize, &FollowEdge)> = self
            .follows
            .iter()
            .enumerate()
            .filter(|(_, edge)| !edge.is_self_edge() && select(edge))
            .collect();
        edges.sort_by_key(|(seq, edge)| Reverse((edge.created_at, *seq)));

        let total = edges.len() as i64;
        let items = edges
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|(_, edge)| self.summary(pick(edge)))
            .collect::<SocialResult<Vec<_>>>()?;

        Ok((items, total))
    }
}

/// Store keeping everything in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Have another request create the same row just before the next
    /// follow or like insert commits
    #[cfg(test)]
    pub(crate) async fn interleave_next_insert(&self) {
        self.inner.lock().await.concurrent_insert = true;
    }
}

impl SocialStore for MemoryStore {
    async fn create_identity(&self, new_identity: NewIdentity) -> SocialResult<Provisioned> {
        let mut tables = self.inner.lock().await;

        if tables
            .identities
            .iter()
            .any(|identity| identity.username == new_identity.username)
        {
            return Err(SocialError::DuplicateUsername);
        }
        if tables
            .identities
            .iter()
            .any(|identity| identity.email == new_identity.email)
        {
            return Err(SocialError::DuplicateEmail);
        }

        let now = Utc::now();
        let identity = Identity {
            id: Uuid::new_v4(),
            username: new_identity.username,
            email: new_identity.email,
            password_hash: new_identity.password_hash,
            is_active: false,
            created_at: now,
            updated_at: now,
        };

        let taken: HashSet<String> = tables
            .profiles
            .iter()
            .map(|profile| profile.slug.clone())
            .collect();
        let profile = Profile {
            id: Uuid::new_v4(),
            owner_id: identity.id,
            full_name: String::new(),
            avatar: DEFAULT_AVATAR.to_string(),
            bio: String::new(),
            slug: unique_slug(&slugify(&identity.username), &taken),
        };

        let self_edge = FollowEdge {
            id: Uuid::new_v4(),
            follower_id: identity.id,
            following_id: identity.id,
            created_at: now,
        };

        tables.identities.push(identity.clone());
        tables.profiles.push(profile.clone());
        tables.follows.push(self_edge.clone());

        Ok(Provisioned {
            identity,
            profile,
            self_edge,
        })
    }

    async fn find_identity_by_id(&self, id: Uuid) -> SocialResult<Option<Identity>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .identities
            .iter()
            .find(|identity| identity.id == id)
            .cloned())
    }

    async fn find_identity_by_username(&self, username: &str) -> SocialResult<Option<Identity>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .identities
            .iter()
            .find(|identity| identity.username == username)
            .cloned())
    }

    async fn find_identity_by_email(&self, email: &str) -> SocialResult<Option<Identity>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .identities
            .iter()
            .find(|identity| identity.email == email)
            .cloned())
    }

    async fn activate_identity(&self, id: Uuid) -> SocialResult<bool> {
        let mut tables = self.inner.lock().await;
        match tables.identities.iter_mut().find(|identity| identity.id == id) {
            Some(identity) => {
                identity.is_active = true;
                identity.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> SocialResult<bool> {
        let mut tables = self.inner.lock().await;
        match tables.identities.iter_mut().find(|identity| identity.id == id) {
            Some(identity) => {
                identity.password_hash = password_hash.to_string();
                identity.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_identities_except(&self, id: Uuid) -> SocialResult<Vec<IdentitySummary>> {
        let tables = self.inner.lock().await;
        let mut summaries = tables
            .identities
            .iter()
            .filter(|identity| identity.id != id)
            .map(|identity| tables.summary(identity.id))
            .collect::<SocialResult<Vec<_>>>()?;
        summaries.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(summaries)
    }

    async fn find_profile_by_slug(&self, slug: &str) -> SocialResult<Option<Profile>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .profiles
            .iter()
            .find(|profile| profile.slug == slug)
            .cloned())
    }

    async fn find_profile_by_owner(&self, owner_id: Uuid) -> SocialResult<Option<Profile>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .profiles
            .iter()
            .find(|profile| profile.owner_id == owner_id)
            .cloned())
    }

    async fn update_profile(
        &self,
        owner_id: Uuid,
        changes: ProfileChanges,
    ) -> SocialResult<Profile> {
        let mut tables = self.inner.lock().await;
        let profile = tables
            .profiles
            .iter_mut()
            .find(|profile| profile.owner_id == owner_id)
            .ok_or(SocialError::NotFound("profile"))?;

        if let Some(full_name) = changes.full_name {
            profile.full_name = full_name;
        }
        if let Some(bio) = changes.bio {
            profile.bio = bio;
        }
        if let Some(avatar) = changes.avatar {
            profile.avatar = avatar;
        }

        Ok(profile.clone())
    }

    async fn insert_follow(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<FollowEdge> {
        let mut tables = self.inner.lock().await;
        if !tables.identity_exists(follower_id) || !tables.identity_exists(following_id) {
            return Err(SocialError::NotFound("identity"));
        }
        #[cfg(test)]
        if std::mem::take(&mut tables.concurrent_insert) {
            tables.follows.push(FollowEdge {
                id: Uuid::new_v4(),
                follower_id,
                following_id,
                created_at: Utc::now(),
            });
        }
        if tables
            .follows
            .iter()
            .any(|edge| edge.follower_id == follower_id && edge.following_id == following_id)
        {
            return Err(SocialError::UniquenessViolation("follow edge"));
        }

        let edge = FollowEdge {
            id: Uuid::new_v4(),
            follower_id,
            following_id,
            created_at: Utc::now(),
        };
        tables.follows.push(edge.clone());
        Ok(edge)
    }

    async fn delete_follow(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<bool> {
        let mut tables = self.inner.lock().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|edge| !(edge.follower_id == follower_id && edge.following_id == following_id));
        Ok(tables.follows.len() < before)
    }

    async fn follow_exists(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<bool> {
        let tables = self.inner.lock().await;
        Ok(tables
            .follows
            .iter()
            .any(|edge| edge.follower_id == follower_id && edge.following_id == following_id))
    }

    async fn followed_ids(&self, follower_id: Uuid) -> SocialResult<Vec<Uuid>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .follows
            .iter()
            .filter(|edge| edge.follower_id == follower_id)
            .map(|edge| edge.following_id)
            .collect())
    }

    async fn list_followers(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> SocialResult<(Vec<IdentitySummary>, i64)> {
        let tables = self.inner.lock().await;
        tables.edge_page(page, |edge| edge.following_id == id, |edge| edge.follower_id)
    }

    async fn list_followings(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> SocialResult<(Vec<IdentitySummary>, i64)> {
        let tables = self.inner.lock().await;
        tables.edge_page(page, |edge| edge.follower_id == id, |edge| edge.following_id)
    }

    async fn follow_counts(&self, id: Uuid) -> SocialResult<(i64, i64)> {
        let tables = self.inner.lock().await;
        let edges = tables.follows.iter().filter(|edge| !edge.is_self_edge());
        let (mut followers, mut followings) = (0, 0);
        for edge in edges {
            if edge.following_id == id {
                followers += 1;
            }
            if edge.follower_id == id {
                followings += 1;
            }
        }
        Ok((followers, followings))
    }

    async fn insert_post(&self, author_id: Uuid, text: &str) -> SocialResult<Post> {
        let mut tables = self.inner.lock().await;
        if !tables.identity_exists(author_id) {
            return Err(SocialError::NotFound("identity"));
        }

        let post = Post {
            id: Uuid::new_v4(),
            author_id,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn insert_photo(&self, post_id: Uuid, uploader_id: Uuid, image: &str) -> SocialResult<Photo> {
        let mut tables = self.inner.lock().await;
        if !tables.posts.iter().any(|post| post.id == post_id) {
            return Err(SocialError::NotFound("post"));
        }

        let photo = Photo {
            id: Uuid::new_v4(),
            post_id,
            uploader_id,
            image: image.to_string(),
            uploaded_at: Utc::now(),
        };
        tables.photos.push(photo.clone());
        Ok(photo)
    }

    async fn delete_post(&self, post_id: Uuid) -> SocialResult<bool> {
        let mut tables = self.inner.lock().await;
        let before = tables.posts.len();
        tables.posts.retain(|post| post.id != post_id);
        if tables.posts.len() == before {
            return Ok(false);
        }

        tables.photos.retain(|photo| photo.post_id != post_id);
        tables.likes.retain(|like| like.post_id != post_id);
        Ok(true)
    }

    async fn find_post(&self, post_id: Uuid) -> SocialResult<Option<PostView>> {
        let tables = self.inner.lock().await;
        tables
            .posts
            .iter()
            .find(|post| post.id == post_id)
            .map(|post| tables.post_view(post))
            .transpose()
    }

    async fn posts_by_authors(
        &self,
        author_ids: &[Uuid],
        page: PageRequest,
    ) -> SocialResult<(Vec<PostView>, i64)> {
        let tables = self.inner.lock().await;
        let mut posts: Vec<(usize, &Post)> = tables
            .posts
            .iter()
            .enumerate()
            .filter(|(_, post)| author_ids.contains(&post.author_id))
            .collect();
        posts.sort_by_key(|(seq, post)| Reverse((post.created_at, *seq)));

        let total = posts.len() as i64;
        let items = posts
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit as usize)
            .map(|(_, post)| tables.post_view(post))
            .collect::<SocialResult<Vec<_>>>()?;

        Ok((items, total))
    }

    async fn insert_like(&self, liker_id: Uuid, post_id: Uuid) -> SocialResult<Like> {
        let mut tables = self.inner.lock().await;
        if !tables.posts.iter().any(|post| post.id == post_id) {
            return Err(SocialError::NotFound("post"));
        }
        if !tables.identity_exists(liker_id) {
            return Err(SocialError::NotFound("identity"));
        }
        #[cfg(test)]
        if std::mem::take(&mut tables.concurrent_insert) {
            tables.likes.push(Like {
                id: Uuid::new_v4(),
                liker_id,
                post_id,
                created_at: Utc::now(),
            });
        }
        if tables
            .likes
            .iter()
            .any(|like| like.liker_id == liker_id && like.post_id == post_id)
        {
            return Err(SocialError::UniquenessViolation("like"));
        }

        let like = Like {
            id: Uuid::new_v4(),
            liker_id,
            post_id,
            created_at: Utc::now(),
        };
        tables.likes.push(like.clone());
        Ok(like)
    }

    async fn delete_like(&self, liker_id: Uuid, post_id: Uuid) -> SocialResult<bool> {
        let mut tables = self.inner.lock().await;
        let before = tables.likes.len();
        tables
            .likes
            .retain(|like| !(like.liker_id == liker_id && like.post_id == post_id));
        Ok(tables.likes.len() < before)
    }

    async fn liked_post_ids(&self, liker_id: Uuid, post_ids: &[Uuid]) -> SocialResult<Vec<Uuid>> {
        let tables = self.inner.lock().await;
        Ok(tables
            .likes
            .iter()
            .filter(|like| like.liker_id == liker_id && post_ids.contains(&like.post_id))
            .map(|like| like.post_id)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_identity(username: &str) -> NewIdentity {
        NewIdentity {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_identity_provisions_profile_and_self_edge() {
        let store = MemoryStore::new();
        let provisioned = store.create_identity(new_identity("alice")).await.unwrap();

        assert_eq!(provisioned.profile.owner_id, provisioned.identity.id);
        assert_eq!(provisioned.profile.slug, "alice");
        assert_eq!(provisioned.profile.avatar, DEFAULT_AVATAR);
        assert!(provisioned.self_edge.is_self_edge());
        assert!(!provisioned.identity.is_active);

        let id = provisioned.identity.id;
        assert!(store.follow_exists(id, id).await.unwrap());
        assert_eq!(store.follow_counts(id).await.unwrap(), (0, 0));
    }

    #[tokio::test]
    async fn test_duplicates_rejected() {
        let store = MemoryStore::new();
        store.create_identity(new_identity("alice")).await.unwrap();

        let mut same_name = new_identity("alice");
        same_name.email = "other@example.com".to_string();
        assert!(matches!(
            store.create_identity(same_name).await,
            Err(SocialError::DuplicateUsername)
        ));

        let mut same_email = new_identity("bob");
        same_email.email = "alice@example.com".to_string();
        assert!(matches!(
            store.create_identity(same_email).await,
            Err(SocialError::DuplicateEmail)
        ));
    }

    #[tokio::test]
    async fn test_colliding_slugs_get_suffixes() {
        let store = MemoryStore::new();
        let first = store.create_identity(new_identity("Alice")).await.unwrap();
        let second = store.create_identity(new_identity("alice")).await.unwrap();
        let third = store.create_identity(new_identity("ALICE")).await.unwrap();

        assert_eq!(first.profile.slug, "alice");
        assert_eq!(second.profile.slug, "alice-2");
        assert_eq!(third.profile.slug, "alice-3");
    }

    #[tokio::test]
    async fn test_reserved_slug_gets_a_suffix() {
        let store = MemoryStore::new();
        let provisioned = store.create_identity(new_identity("update")).await.unwrap();

        assert_eq!(provisioned.identity.username, "update");
        assert_eq!(provisioned.profile.slug, "update-2");
        assert!(store.find_profile_by_slug("update").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_follow_is_a_uniqueness_violation() {
        let store = MemoryStore::new();
        let a = store.create_identity(new_identity("alice")).await.unwrap().identity.id;
        let b = store.create_identity(new_identity("bob")).await.unwrap().identity.id;

        store.insert_follow(a, b).await.unwrap();
        assert!(matches!(
            store.insert_follow(a, b).await,
            Err(SocialError::UniquenessViolation("follow edge"))
        ));
        assert!(matches!(
            store.insert_follow(a, Uuid::new_v4()).await,
            Err(SocialError::NotFound("identity"))
        ));
    }

    #[tokio::test]
    async fn test_delete_post_cascades() {
        let store = MemoryStore::new();
        let a = store.create_identity(new_identity("alice")).await.unwrap().identity.id;
        let post = store.insert_post(a, "hello").await.unwrap();
        store.insert_photo(post.id, a, "photos/x.png").await.unwrap();
        store.insert_like(a, post.id).await.unwrap();

        assert!(store.delete_post(post.id).await.unwrap());
        assert!(store.find_post(post.id).await.unwrap().is_none());
        assert!(store.liked_post_ids(a, &[post.id]).await.unwrap().is_empty());
        assert!(!store.delete_post(post.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_posts_newest_first() {
        let store = MemoryStore::new();
        let a = store.create_identity(new_identity("alice")).await.unwrap().identity.id;
        let first = store.insert_post(a, "first").await.unwrap();
        let second = store.insert_post(a, "second").await.unwrap();

        let (posts, total) = store
            .posts_by_authors(&[a], PageRequest::default())
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(posts[0].id, second.id);
        assert_eq!(posts[1].id, first.id);
        assert_eq!(posts[0].author.slug, "alice");
    }
}
