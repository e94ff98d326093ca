//! Fixtures shared by the unit tests

use uuid::Uuid;

use crate::{
    models::NewIdentity,
    store::{MemoryStore, SocialStore},
};

/// Provision an identity without going through password hashing
pub async fn identity(store: &MemoryStore, username: &str) -> Uuid {
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
