//! Integration tests for the PostgreSQL store
//!
//! They need a running PostgreSQL instance reachable through `DATABASE_URL`
//! and are ignored by default:
//!
//! ```text
//! cargo test -p social -- --ignored
//! ```

use common::database::{DatabaseConfig, init_pool};
use social::{
    SocialError,
    feed::compose_feed,
    follow_graph::{followings_of, toggle_follow},
    likes::toggle_like,
    models::NewIdentity,
    pagination::PageRequest,
    store::{PgStore, SocialStore},
};
use uuid::Uuid;

async fn store() -> PgStore {
    let config = DatabaseConfig::from_env().unwrap();
    let store = PgStore::new(init_pool(&config).await.unwrap());
    store.migrate().await.unwrap();
    store
}

/// Usernames unique per run so the tests can share a database
fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

async fn identity(store: &PgStore, username: &str) -> Uuid {
    store
        .create_identity(NewIdentity {
            username: username.to_string(),
            email: format!("{}@example.com", username),
            password_hash: "not-a-real-hash".to_string(),
        })
        .await
        .unwrap()
        .identity
        .id
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_provisioning_and_duplicates() {
    let store = store().await;
    let username = unique("alice");

    let provisioned = store
        .create_identity(NewIdentity {
            username: username.clone(),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(provisioned.profile.slug, username);
    assert!(provisioned.self_edge.is_self_edge());

    let duplicate = store
        .create_identity(NewIdentity {
            username: username.clone(),
            email: format!("other-{}@example.com", username),
            password_hash: "hash".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(SocialError::DuplicateUsername)));

    let duplicate = store
        .create_identity(NewIdentity {
            username: unique("bob"),
            email: format!("{}@example.com", username),
            password_hash: "hash".to_string(),
        })
        .await;
    assert!(matches!(duplicate, Err(SocialError::DuplicateEmail)));
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_follow_post_like_scenario() {
    let store = store().await;
    let alice = identity(&store, &unique("alice")).await;
    let bob = identity(&store, &unique("bob")).await;

    assert!(toggle_follow(&store, alice, bob).await.unwrap().following);
    let followings = followings_of(&store, alice, PageRequest::default()).await.unwrap();
    assert_eq!(followings.total, 1);
    assert_eq!(followings.items[0].id, bob);

    let post = store.insert_post(bob, "hello").await.unwrap();
    store.insert_photo(post.id, bob, "/media/photos/x.png").await.unwrap();

    let feed = compose_feed(&store, alice, PageRequest::default()).await.unwrap();
    assert_eq!(feed.posts[0].id, post.id);
    assert_eq!(feed.posts[0].photos.len(), 1);

    assert!(toggle_like(&store, alice, post.id).await.unwrap().liked);
    assert!(matches!(
        store.insert_like(alice, post.id).await,
        Err(SocialError::UniquenessViolation("like"))
    ));
    assert!(!toggle_like(&store, alice, post.id).await.unwrap().liked);

    assert!(store.delete_post(post.id).await.unwrap());
    assert!(store.find_post(post.id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a running PostgreSQL instance"]
async fn test_concurrent_registrations_sharing_a_slug() {
    let store = store().await;
    let lower = unique("race");
    let upper = lower.to_uppercase();

    let (first, second) = tokio::join!(
        store.create_identity(NewIdentity {
            username: lower.clone(),
            email: format!("{}@example.com", lower),
            password_hash: "hash".to_string(),
        }),
        store.create_identity(NewIdentity {
            username: upper.clone(),
            email: format!("upper-{}@example.com", lower),
            password_hash: "hash".to_string(),
        }),
    );

    let mut slugs = vec![first.unwrap().profile.slug, second.unwrap().profile.slug];
    slugs.sort();
    assert_eq!(slugs, vec![lower.clone(), format!("{}-2", lower)]);
}
