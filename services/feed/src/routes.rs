//! Feed service routes

use axum::{
    Extension, Form, Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};
use social::{
    feed::{Feed, compose_feed},
    follow_graph::{followers_of, followings_of, toggle_follow},
    likes::toggle_like,
    models::{FollowState, IdentitySummary, Profile, ProfileView},
    pagination::{PageQuery, Paginated},
    posts::{self, PostDetail},
    profiles,
    store::SocialStore,
};
use tracing::warn;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    forms::{read_post_form, read_profile_form},
    middleware::{AuthUser, auth_middleware},
    state::AppState,
};

/// Like toggle form
#[derive(Debug, Deserialize)]
pub struct LikeForm {
    pub post_id: Uuid,
}

/// Create the router for the feed service
pub fn create_router<S: SocialStore>(state: AppState<S>) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    let protected_routes = Router::new()
        .route("/feed", get(feed::<S>).post(create_post::<S>))
        .route("/feed/like", post(like::<S>))
        .route("/feed/:post_id", get(post_detail::<S>))
        .route("/feed/profile/:slug", get(profile::<S>).post(follow::<S>))
        .route(
            "/feed/profile/update/:slug",
            put(update_profile::<S>).post(update_profile::<S>),
        )
        .route("/feed/profile/:slug/followers", get(followers::<S>))
        .route("/feed/profile/:slug/followings", get(followings::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<S>,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "feed-service"
    }))
}

/// Posts of everyone the viewer follows
pub async fn feed<S: SocialStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Feed>> {
    let feed = compose_feed(&state.store, user.id, query.into()).await?;
    Ok(Json(feed))
}

/// Create a post from a multipart form
pub async fn create_post<S: SocialStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    multipart: Multipart,
) -> ApiResult<Response> {
    let form = read_post_form(multipart)
        .await?
        .clean(state.config.max_photos_per_post)?;

    match posts::create_post(&state.store, &state.storage, user.id, form).await? {
        Some(post) => Ok((StatusCode::CREATED, Json(post)).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// A single post with the viewer's like state
pub async fn post_detail<S: SocialStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(post_id): Path<Uuid>,
) -> ApiResult<Json<PostDetail>> {
    let detail = posts::get_post(&state.store, user.id, post_id).await?;
    Ok(Json(detail))
}

/// Toggle the viewer's like on a post
pub async fn like<S: SocialStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Form(form): Form<LikeForm>,
) -> ApiResult<Json<Value>> {
    let like_state = toggle_like(&state.store, user.id, form.post_id).await?;

    if like_state.liked {
        Ok(Json(json!({ "liked": true })))
    } else {
        Ok(Json(json!({ "unliked": true })))
    }
}

/// Profile page
pub async fn profile<S: SocialStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> ApiResult<Json<ProfileView>> {
    let view = profiles::view_profile(&state.store, user.id, &slug).await?;
    Ok(Json(view))
}

/// Toggle the viewer's follow of the profile owner
pub async fn follow<S: SocialStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> ApiResult<Json<FollowState>> {
    let profile = profiles::find_by_slug(&state.store, &slug).await?;
    let follow_state = toggle_follow(&state.store, user.id, profile.owner_id).await?;
    Ok(Json(follow_state))
}

/// Update the viewer's own profile
pub async fn update_profile<S: SocialStore>(
    State(state): State<AppState<S>>,
    Extension(user): Extension<AuthUser>,
    Path(slug): Path<String>,
    multipart: Multipart,
) -> ApiResult<Json<Profile>> {
    let profile = profiles::find_by_slug(&state.store, &slug).await?;
    if profile.owner_id != user.id {
        warn!("Identity {} tried to update profile {}", user.id, slug);
        return Err(ApiError::Forbidden);
    }

    let form = read_profile_form(multipart).await?.clean()?;
    let updated = profiles::update_profile(&state.store, &state.storage, user.id, form).await?;
    Ok(Json(updated))
}

/// Identities following the profile owner
pub async fn followers<S: SocialStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<IdentitySummary>>> {
    let profile = profiles::find_by_slug(&state.store, &slug).await?;
    let page = followers_of(&state.store, profile.owner_id, query.into()).await?;
    Ok(Json(page))
}

/// Identities the profile owner follows
pub async fn followings<S: SocialStore>(
    State(state): State<AppState<S>>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> ApiResult<Json<Paginated<IdentitySummary>>> {
    let profile = profiles::find_by_slug(&state.store, &slug).await?;
    let page = followings_of(&state.store, profile.owner_id, query.into()).await?;
    Ok(Json(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::FeedConfig, forms::tests::multipart};
    use axum::body::to_bytes;
    use common::{
        jwt::{JwtConfig, JwtKeys, JwtService},
        storage::{BlobStorage, LocalStorage},
    };
    use social::{provisioning::create_identity, store::MemoryStore};
    use std::sync::Arc;

    fn app_state() -> AppState<MemoryStore> {
        let jwt = JwtService::new(JwtConfig {
            keys: JwtKeys::Secret("routes-test-secret".to_string()),
            access_token_expiry: 900,
        })
        .unwrap();
        let root = std::env::temp_dir().join(format!("feed-routes-{}", Uuid::new_v4()));

        AppState {
            store: MemoryStore::new(),
            storage: BlobStorage::Local(LocalStorage::new(root, "/media")),
            jwt,
            config: Arc::new(FeedConfig::default()),
        }
    }

    async fn register(state: &AppState<MemoryStore>, username: &str) -> AuthUser {
        let provisioned = create_identity(
            &state.store,
            username,
            &format!("{}@example.com", username),
            "correct-horse",
        )
        .await
        .unwrap();
        AuthUser {
            id: provisioned.identity.id,
        }
    }

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_follow_post_feed_like_scenario() {
        let state = app_state();
        let alice = register(&state, "alice").await;
        let bob = register(&state, "bob").await;

        let Json(follow_state) = follow(
            State(state.clone()),
            Extension(alice),
            Path("bob".to_string()),
        )
        .await
        .unwrap();
        assert!(follow_state.following);

        let Json(followings) = followings(
            State(state.clone()),
            Path("alice".to_string()),
            Query(PageQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(followings.total, 1);
        assert_eq!(followings.items[0].id, bob.id);

        let response = create_post(
            State(state.clone()),
            Extension(bob),
            multipart(&[("text", None, "hello")]).await,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let post_id: Uuid = serde_json::from_value(body_json(response).await["id"].clone()).unwrap();

        let Json(alice_feed) = feed(
            State(state.clone()),
            Extension(alice),
            Query(PageQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(alice_feed.posts.len(), 1);
        assert_eq!(alice_feed.posts[0].id, post_id);
        assert_eq!(alice_feed.posts[0].text, "hello");

        let Json(liked) = like(
            State(state.clone()),
            Extension(alice),
            Form(LikeForm { post_id }),
        )
        .await
        .unwrap();
        assert_eq!(liked, json!({ "liked": true }));

        let Json(unliked) = like(
            State(state.clone()),
            Extension(alice),
            Form(LikeForm { post_id }),
        )
        .await
        .unwrap();
        assert_eq!(unliked, json!({ "unliked": true }));
    }

    #[tokio::test]
    async fn test_empty_post_returns_no_content() {
        let state = app_state();
        let alice = register(&state, "alice").await;

        let response = create_post(
            State(state.clone()),
            Extension(alice),
            multipart(&[("text", None, "   ")]).await,
        )
        .await
        .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let Json(alice_feed) = feed(
            State(state.clone()),
            Extension(alice),
            Query(PageQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(alice_feed.total, 0);
        assert!(alice_feed.suggestions.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_too_many_photos() {
        let mut state = app_state();
        state.config = Arc::new(FeedConfig {
            max_photos_per_post: 1,
            ..FeedConfig::default()
        });
        let alice = register(&state, "alice").await;

        let result = create_post(
            State(state.clone()),
            Extension(alice),
            multipart(&[
                ("photos", Some("a.png"), "a"),
                ("photos", Some("b.png"), "b"),
            ])
            .await,
        )
        .await;
        assert!(matches!(
            result,
            Err(ApiError::Validation { field: "photos", .. })
        ));
    }

    #[tokio::test]
    async fn test_unknown_post_and_like_target() {
        let state = app_state();
        let alice = register(&state, "alice").await;

        let result = post_detail(State(state.clone()), Extension(alice), Path(Uuid::new_v4())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));

        let result = like(
            State(state.clone()),
            Extension(alice),
            Form(LikeForm {
                post_id: Uuid::new_v4(),
            }),
        )
        .await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_following_oneself_is_a_bad_request() {
        let state = app_state();
        let alice = register(&state, "alice").await;

        let result = follow(State(state.clone()), Extension(alice), Path("alice".to_string())).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_profile_view_and_update() {
        let state = app_state();
        let alice = register(&state, "alice").await;
        let bob = register(&state, "bob").await;

        let result = update_profile(
            State(state.clone()),
            Extension(bob),
            Path("alice".to_string()),
            multipart(&[("full_name", None, "Not Alice")]).await,
        )
        .await;
        assert!(matches!(result, Err(ApiError::Forbidden)));

        let Json(updated) = update_profile(
            State(state.clone()),
            Extension(alice),
            Path("alice".to_string()),
            multipart(&[("full_name", None, "Alice Liddell"), ("bio", None, "Curious")]).await,
        )
        .await
        .unwrap();
        assert_eq!(updated.full_name, "Alice Liddell");
        assert_eq!(updated.slug, "alice");

        let Json(view) = profile(State(state.clone()), Extension(bob), Path("alice".to_string()))
            .await
            .unwrap();
        assert_eq!(view.profile.bio, "Curious");
        assert_eq!(view.followers_count, 0);
        assert!(!view.is_self);

        let result = profile(State(state.clone()), Extension(bob), Path("carol".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
