//! Password hashing

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sha2::{Digest, Sha256};

use crate::{
    error::{SocialError, SocialResult},
    models::Identity,
};

/// Hex characters kept from the password hash digest
const FINGERPRINT_LEN: usize = 16;

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> SocialResult<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| SocialError::Credential(format!("Failed to hash password: {}", e)))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against a stored PHC string
pub fn verify_password(password_hash: &str, password: &str) -> SocialResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| SocialError::Credential(format!("Failed to parse password hash: {}", e)))?;

    let argon2 = Argon2::default();
    let result = argon2.verify_password(password.as_bytes(), &parsed_hash);

    Ok(result.is_ok())
}

/// Short digest of the identity's password hash
///
/// Password reset tokens embed it so a token stops working once the password
/// is replaced. Every new hash carries a fresh salt, so resetting to the same
/// password still changes it.
pub fn password_fingerprint(identity: &Identity) -> String {
    let digest = format!("{:x}", Sha256::digest(identity.password_hash.as_bytes()));
    digest[..FINGERPRINT_LEN].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "s3cret-pass").unwrap());
        assert!(!verify_password(&hash, "wrong-pass").unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_fingerprint_follows_the_password_hash() {
        let mut identity = Identity {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: hash_password("first-password").unwrap(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let before = password_fingerprint(&identity);
        assert_eq!(before.len(), 16);
        assert!(!identity.password_hash.contains(&before));

        identity.updated_at = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(password_fingerprint(&identity), before);

        identity.password_hash = hash_password("first-password").unwrap();
        assert_ne!(password_fingerprint(&identity), before);
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("not-a-phc-string", "x").is_err());
    }
}
