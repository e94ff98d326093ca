//! Account provisioning

use tracing::info;

use crate::{
    credentials::hash_password,
    error::SocialResult,
    models::{NewIdentity, Provisioned},
    store::SocialStore,
    validation::{normalize_email, validate_password, validate_username},
};

/// Create an identity with its profile and self follow edge
///
/// The username and password are validated, the email normalized and the
/// password hashed before anything is written. Fails with
/// `DuplicateUsername`/`DuplicateEmail` without creating any row.
pub async fn create_identity<S: SocialStore>(
    store: &S,
    username: &str,
    email: &str,
    password: &str,
) -> SocialResult<Provisioned> {
    validate_username(username)?;
    let email = normalize_email(email)?;
    validate_password(password)?;

    let provisioned = store
        .create_identity(NewIdentity {
            username: username.to_string(),
            email,
            password_hash: hash_password(password)?,
        })
        .await?;

    info!(
        "Identity {} registered with slug {}",
        provisioned.identity.username, provisioned.profile.slug
    );
    Ok(provisioned)
}
