//! PostgreSQL implementation of the social store

use chrono::Utc;
use common::error::{DatabaseError, foreign_key_violation, unique_violation};
use sqlx::{PgConnection, PgPool, Row, postgres::PgRow};
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};
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

/// Slugs tried before provisioning gives up
const SLUG_ATTEMPTS: usize = 5;

const IDENTITY_COLUMNS: &str =
    "id, username, email, password_hash, is_active, created_at, updated_at";
const PROFILE_COLUMNS: &str = "id, owner_id, full_name, avatar, bio, slug";

const POST_VIEW_SELECT: &str = r#"
    SELECT p.id, p.author_id, p.text, p.created_at,
           i.username, pr.slug, pr.full_name, pr.avatar,
           (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS likes_count
    FROM posts p
    JOIN identities i ON i.id = p.author_id
    JOIN profiles pr ON pr.owner_id = p.author_id
"#;

/// Store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Create a new store
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> SocialResult<()> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;
        Ok(())
    }

    async fn attach_photos(&self, posts: &mut [PostView]) -> SocialResult<()> {
        if posts.is_empty() {
            return Ok(());
        }

        let ids: Vec<Uuid> = posts.iter().map(|post| post.id).collect();
        let photos = sqlx::query_as::<_, Photo>(
            r#"
            SELECT id, post_id, uploader_id, image, uploaded_at
            FROM photos
            WHERE post_id = ANY($1)
            ORDER BY uploaded_at, id
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        let mut by_post: HashMap<Uuid, Vec<Photo>> = HashMap::new();
        for photo in photos {
            by_post.entry(photo.post_id).or_default().push(photo);
        }

        for post in posts.iter_mut() {
            if let Some(photos) = by_post.remove(&post.id) {
                post.photos = photos;
            }
        }

        Ok(())
    }

    async fn list_edges(
        &self,
        id: Uuid,
        page: PageRequest,
        anchor: &str,
        other: &str,
    ) -> SocialResult<(Vec<IdentitySummary>, i64)> {
        let rows = sqlx::query_as::<_, IdentitySummary>(&format!(
            r#"
            SELECT i.id, i.username, pr.slug, pr.full_name, pr.avatar
            FROM follow_edges f
            JOIN identities i ON i.id = f.{other}
            JOIN profiles pr ON pr.owner_id = i.id
            WHERE f.{anchor} = $1 AND f.follower_id <> f.following_id
            ORDER BY f.created_at DESC, f.id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(id)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM follow_edges WHERE {anchor} = $1 AND follower_id <> following_id"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        Ok((rows, total))
    }
}

fn query_error(err: sqlx::Error) -> SocialError {
    SocialError::Database(DatabaseError::Query(err))
}

/// Map a failed insert onto the core taxonomy
fn insert_error(err: sqlx::Error, duplicate: &'static str, missing: &'static str) -> SocialError {
    if unique_violation(&err).is_some() {
        SocialError::UniquenessViolation(duplicate)
    } else if foreign_key_violation(&err) {
        SocialError::NotFound(missing)
    } else {
        query_error(err)
    }
}

fn identity_insert_error(err: sqlx::Error) -> SocialError {
    let duplicate = match unique_violation(&err) {
        Some("identities_username_key") => Some(SocialError::DuplicateUsername),
        Some("identities_email_key") => Some(SocialError::DuplicateEmail),
        Some(_) => Some(SocialError::UniquenessViolation("identity")),
        None => None,
    };

    duplicate.unwrap_or_else(|| query_error(err))
}

/// Insert the profile under the first free slug derived from `username`
///
/// A concurrent registration can claim the chosen slug between the read and
/// the insert; `ON CONFLICT DO NOTHING` keeps the transaction usable so the
/// next candidate is tried instead.
async fn insert_profile(
    conn: &mut PgConnection,
    owner_id: Uuid,
    username: &str,
) -> SocialResult<Profile> {
    let base = slugify(username);
    let mut taken: HashSet<String> =
        sqlx::query_scalar::<_, String>("SELECT slug FROM profiles WHERE slug = $1 OR slug LIKE $2")
            .bind(&base)
            .bind(format!("{}-%", base))
            .fetch_all(&mut *conn)
            .await
            .map_err(query_error)?
            .into_iter()
            .collect();

    for _ in 0..SLUG_ATTEMPTS {
        let slug = unique_slug(&base, &taken);

        let inserted = sqlx::query_as::<_, Profile>(&format!(
            r#"
            INSERT INTO profiles (id, owner_id, full_name, avatar, bio, slug)
            VALUES ($1, $2, '', $3, '', $4)
            ON CONFLICT (slug) DO NOTHING
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(DEFAULT_AVATAR)
        .bind(&slug)
        .fetch_optional(&mut *conn)
        .await
        .map_err(|e| insert_error(e, "profile", "identity"))?;

        match inserted {
            Some(profile) => return Ok(profile),
            None => {
                warn!("Slug {} was claimed concurrently, trying the next one", slug);
                taken.insert(slug);
            }
        }
    }

    Err(SocialError::UniquenessViolation("profile slug"))
}

fn post_view_from_row(row: &PgRow) -> PostView {
    PostView {
        id: row.get("id"),
        author: IdentitySummary {
            id: row.get("author_id"),
            username: row.get("username"),
            slug: row.get("slug"),
            full_name: row.get("full_name"),
            avatar: row.get("avatar"),
        },
        text: row.get("text"),
        created_at: row.get("created_at"),
        photos: Vec::new(),
        likes_count: row.get("likes_count"),
    }
}

impl SocialStore for PgStore {
    async fn create_identity(&self, new_identity: NewIdentity) -> SocialResult<Provisioned> {
        info!("Creating identity: {}", new_identity.username);

        let mut tx = self.pool.begin().await.map_err(query_error)?;
        let now = Utc::now();

        let identity = sqlx::query_as::<_, Identity>(&format!(
            r#"
            INSERT INTO identities (id, username, email, password_hash, is_active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, FALSE, $5, $5)
            RETURNING {IDENTITY_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&new_identity.username)
        .bind(&new_identity.email)
        .bind(&new_identity.password_hash)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(identity_insert_error)?;

        let profile = insert_profile(&mut *tx, identity.id, &identity.username).await?;

        let self_edge = sqlx::query_as::<_, FollowEdge>(
            r#"
            INSERT INTO follow_edges (id, follower_id, following_id, created_at)
            VALUES ($1, $2, $2, $3)
            RETURNING id, follower_id, following_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(identity.id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| insert_error(e, "follow edge", "identity"))?;

        tx.commit().await.map_err(query_error)?;

        info!("Provisioned identity {} with profile {}", identity.id, profile.slug);
        Ok(Provisioned {
            identity,
            profile,
            self_edge,
        })
    }

    async fn find_identity_by_id(&self, id: Uuid) -> SocialResult<Option<Identity>> {
        sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn find_identity_by_username(&self, username: &str) -> SocialResult<Option<Identity>> {
        info!("Finding identity by username: {}", username);

        sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn find_identity_by_email(&self, email: &str) -> SocialResult<Option<Identity>> {
        sqlx::query_as::<_, Identity>(&format!(
            "SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn activate_identity(&self, id: Uuid) -> SocialResult<bool> {
        let result = sqlx::query(
            "UPDATE identities SET is_active = TRUE, updated_at = $2 WHERE id = $1",
        )
        .bind(id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> SocialResult<bool> {
        let result = sqlx::query(
            "UPDATE identities SET password_hash = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_identities_except(&self, id: Uuid) -> SocialResult<Vec<IdentitySummary>> {
        sqlx::query_as::<_, IdentitySummary>(
            r#"
            SELECT i.id, i.username, pr.slug, pr.full_name, pr.avatar
            FROM identities i
            JOIN profiles pr ON pr.owner_id = i.id
            WHERE i.id <> $1
            ORDER BY i.username
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn find_profile_by_slug(&self, slug: &str) -> SocialResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn find_profile_by_owner(&self, owner_id: Uuid) -> SocialResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE owner_id = $1"
        ))
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn update_profile(
        &self,
        owner_id: Uuid,
        changes: ProfileChanges,
    ) -> SocialResult<Profile> {
        info!("Updating profile of identity: {}", owner_id);

        sqlx::query_as::<_, Profile>(&format!(
            r#"
            UPDATE profiles
            SET full_name = COALESCE($2, full_name),
                bio = COALESCE($3, bio),
                avatar = COALESCE($4, avatar)
            WHERE owner_id = $1
            RETURNING {PROFILE_COLUMNS}
            "#
        ))
        .bind(owner_id)
        .bind(changes.full_name)
        .bind(changes.bio)
        .bind(changes.avatar)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error)?
        .ok_or(SocialError::NotFound("profile"))
    }

    async fn insert_follow(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<FollowEdge> {
        sqlx::query_as::<_, FollowEdge>(
            r#"
            INSERT INTO follow_edges (id, follower_id, following_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, follower_id, following_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(follower_id)
        .bind(following_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "follow edge", "identity"))
    }

    async fn delete_follow(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<bool> {
        let result =
            sqlx::query("DELETE FROM follow_edges WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await
                .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn follow_exists(&self, follower_id: Uuid, following_id: Uuid) -> SocialResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM follow_edges WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)
    }

    async fn followed_ids(&self, follower_id: Uuid) -> SocialResult<Vec<Uuid>> {
        sqlx::query_scalar::<_, Uuid>("SELECT following_id FROM follow_edges WHERE follower_id = $1")
            .bind(follower_id)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)
    }

    async fn list_followers(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> SocialResult<(Vec<IdentitySummary>, i64)> {
        self.list_edges(id, page, "following_id", "follower_id").await
    }

    async fn list_followings(
        &self,
        id: Uuid,
        page: PageRequest,
    ) -> SocialResult<(Vec<IdentitySummary>, i64)> {
        self.list_edges(id, page, "follower_id", "following_id").await
    }

    async fn follow_counts(&self, id: Uuid) -> SocialResult<(i64, i64)> {
        let row = sqlx::query(
            r#"
            SELECT
                (SELECT COUNT(*) FROM follow_edges WHERE following_id = $1 AND follower_id <> $1) AS followers,
                (SELECT COUNT(*) FROM follow_edges WHERE follower_id = $1 AND following_id <> $1) AS followings
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error)?;

        Ok((row.get("followers"), row.get("followings")))
    }

    async fn insert_post(&self, author_id: Uuid, text: &str) -> SocialResult<Post> {
        info!("Creating post for identity: {}", author_id);

        sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, text, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, author_id, text, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(text)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "post", "identity"))
    }

    async fn insert_photo(&self, post_id: Uuid, uploader_id: Uuid, image: &str) -> SocialResult<Photo> {
        sqlx::query_as::<_, Photo>(
            r#"
            INSERT INTO photos (id, post_id, uploader_id, image, uploaded_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, post_id, uploader_id, image, uploaded_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(post_id)
        .bind(uploader_id)
        .bind(image)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "photo", "post"))
    }

    async fn delete_post(&self, post_id: Uuid) -> SocialResult<bool> {
        info!("Deleting post: {}", post_id);

        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_post(&self, post_id: Uuid) -> SocialResult<Option<PostView>> {
        let row = sqlx::query(&format!("{POST_VIEW_SELECT} WHERE p.id = $1"))
            .bind(post_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => {
                let mut posts = vec![post_view_from_row(&row)];
                self.attach_photos(&mut posts).await?;
                Ok(posts.pop())
            }
            None => Ok(None),
        }
    }

    async fn posts_by_authors(
        &self,
        author_ids: &[Uuid],
        page: PageRequest,
    ) -> SocialResult<(Vec<PostView>, i64)> {
        if author_ids.is_empty() {
            return Ok((Vec::new(), 0));
        }

        let rows = sqlx::query(&format!(
            r#"
            {POST_VIEW_SELECT}
            WHERE p.author_id = ANY($1)
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(author_ids)
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(query_error)?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM posts WHERE author_id = ANY($1)")
            .bind(author_ids)
            .fetch_one(&self.pool)
            .await
            .map_err(query_error)?;

        let mut posts: Vec<PostView> = rows.iter().map(post_view_from_row).collect();
        self.attach_photos(&mut posts).await?;

        Ok((posts, total))
    }

    async fn insert_like(&self, liker_id: Uuid, post_id: Uuid) -> SocialResult<Like> {
        sqlx::query_as::<_, Like>(
            r#"
            INSERT INTO likes (id, liker_id, post_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, liker_id, post_id, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(liker_id)
        .bind(post_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| insert_error(e, "like", "post"))
    }

    async fn delete_like(&self, liker_id: Uuid, post_id: Uuid) -> SocialResult<bool> {
        let result = sqlx::query("DELETE FROM likes WHERE liker_id = $1 AND post_id = $2")
            .bind(liker_id)
            .bind(post_id)
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn liked_post_ids(&self, liker_id: Uuid, post_ids: &[Uuid]) -> SocialResult<Vec<Uuid>> {
        if post_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar::<_, Uuid>("SELECT post_id FROM likes WHERE liker_id = $1 AND post_id = ANY($2)")
            .bind(liker_id)
            .bind(post_ids)
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)
    }
}
