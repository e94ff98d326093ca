//! Access, activation and password-reset tokens
//!
//! Tokens are JWTs signed with RS256 (PEM key pair) or HS256 (shared secret).
//! The auth service signs them; the feed service only needs the verifying key.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::JwtError;

/// Activation links stay valid for a week
const ACTIVATION_TOKEN_EXPIRY: u64 = 7 * 24 * 3600;
/// Password reset links stay valid for three days
const PASSWORD_RESET_TOKEN_EXPIRY: u64 = 3 * 24 * 3600;

/// Signing material
#[derive(Debug, Clone)]
pub enum JwtKeys {
    /// HS256 shared secret
    Secret(String),
    /// RS256 key pair; services that only verify leave `private_key` unset
    Rsa {
        private_key: Option<String>,
        public_key: String,
    },
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub keys: JwtKeys,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HS256 shared secret; takes precedence over the key pair
    /// - `JWT_PRIVATE_KEY`: Private key for signing tokens (PEM format) or path to private key file
    /// - `JWT_PUBLIC_KEY`: Public key for verifying tokens (PEM format) or path to public key file
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    pub fn from_env() -> Result<Self, JwtError> {
        let keys = match std::env::var("JWT_SECRET") {
            Ok(secret) if !secret.is_empty() => JwtKeys::Secret(secret),
            _ => {
                let public_key = std::env::var("JWT_PUBLIC_KEY").map_err(|_| {
                    JwtError::Configuration(
                        "neither JWT_SECRET nor JWT_PUBLIC_KEY is set".to_string(),
                    )
                })?;
                let private_key = std::env::var("JWT_PRIVATE_KEY")
                    .ok()
                    .map(|key| read_pem(&key))
                    .transpose()?;

                JwtKeys::Rsa {
                    private_key,
                    public_key: read_pem(&public_key)?,
                }
            }
        };

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()
            .unwrap_or(900);

        Ok(JwtConfig {
            keys,
            access_token_expiry,
        })
    }
}

/// Accept inline PEM text or a path to a PEM file
fn read_pem(value: &str) -> Result<String, JwtError> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    std::fs::read_to_string(value)
        .map(|pem| pem.trim().to_string())
        .map_err(|e| JwtError::Configuration(format!("Failed to read key file {}: {}", value, e)))
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    /// Grants access to the feed
    Access,
    /// Activates a freshly registered account
    Activation,
    /// Allows setting a new password once
    PasswordReset,
}

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Identity ID
    pub sub: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type
    pub token_type: TokenType,
    /// Fingerprint of the password hash a reset token was issued against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fp: Option<String>,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    algorithm: Algorithm,
    encoding_key: Option<EncodingKey>,
    decoding_key: DecodingKey,
    validation: Validation,
    access_token_expiry: u64,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> Result<Self, JwtError> {
        let (algorithm, encoding_key, decoding_key) = match &config.keys {
            JwtKeys::Secret(secret) => (
                Algorithm::HS256,
                Some(EncodingKey::from_secret(secret.as_bytes())),
                DecodingKey::from_secret(secret.as_bytes()),
            ),
            JwtKeys::Rsa {
                private_key,
                public_key,
            } => {
                let encoding_key = private_key
                    .as_ref()
                    .map(|pem| EncodingKey::from_rsa_pem(pem.as_bytes()))
                    .transpose()
                    .map_err(JwtError::Key)?;
                let decoding_key =
                    DecodingKey::from_rsa_pem(public_key.as_bytes()).map_err(JwtError::Key)?;
                (Algorithm::RS256, encoding_key, decoding_key)
            }
        };

        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;

        Ok(JwtService {
            algorithm,
            encoding_key,
            decoding_key,
            validation,
            access_token_expiry: config.access_token_expiry,
        })
    }

    /// Whether this service holds a signing key
    pub fn can_sign(&self) -> bool {
        self.encoding_key.is_some()
    }

    /// Get the access token expiry time
    pub fn access_token_expiry(&self) -> u64 {
        self.access_token_expiry
    }

    /// Generate an access token for an identity
    pub fn generate_access_token(&self, identity_id: Uuid) -> Result<String, JwtError> {
        self.issue(identity_id, TokenType::Access, self.access_token_expiry, None)
    }

    /// Generate an account activation token
    pub fn generate_activation_token(&self, identity_id: Uuid) -> Result<String, JwtError> {
        self.issue(identity_id, TokenType::Activation, ACTIVATION_TOKEN_EXPIRY, None)
    }

    /// Generate a password reset token bound to the current password hash
    pub fn generate_password_reset_token(
        &self,
        identity_id: Uuid,
        fingerprint: &str,
    ) -> Result<String, JwtError> {
        self.issue(
            identity_id,
            TokenType::PasswordReset,
            PASSWORD_RESET_TOKEN_EXPIRY,
            Some(fingerprint.to_string()),
        )
    }

    /// Validate a token and check it was issued for `expected`
    pub fn validate_token(&self, token: &str, expected: TokenType) -> Result<Claims, JwtError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(JwtError::Invalid)?;

        if token_data.claims.token_type != expected {
            return Err(JwtError::WrongType);
        }

        Ok(token_data.claims)
    }

    fn issue(
        &self,
        sub: Uuid,
        token_type: TokenType,
        lifetime: u64,
        fp: Option<String>,
    ) -> Result<String, JwtError> {
        let encoding_key = self.encoding_key.as_ref().ok_or_else(|| {
            JwtError::Configuration("no signing key configured".to_string())
        })?;

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| JwtError::Clock)?
            .as_secs();

        let claims = Claims {
            sub,
            iat: now,
            exp: now + lifetime,
            token_type,
            fp,
        };

        encode(&Header::new(self.algorithm), &claims, encoding_key).map_err(JwtError::Signing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            keys: JwtKeys::Secret("test-secret".to_string()),
            access_token_expiry: 900,
        })
        .unwrap()
    }

    #[test]
    fn test_access_token_roundtrip() {
        let service = service();
        let id = Uuid::new_v4();

        let token = service.generate_access_token(id).unwrap();
        let claims = service.validate_token(&token, TokenType::Access).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.exp - claims.iat, 900);
        assert_eq!(claims.fp, None);
    }

    #[test]
    fn test_token_type_is_enforced() {
        let service = service();
        let token = service.generate_activation_token(Uuid::new_v4()).unwrap();

        assert!(matches!(
            service.validate_token(&token, TokenType::Access),
            Err(JwtError::WrongType)
        ));
    }

    #[test]
    fn test_reset_token_carries_fingerprint() {
        let service = service();
        let token = service
            .generate_password_reset_token(Uuid::new_v4(), "abc123")
            .unwrap();

        let claims = service
            .validate_token(&token, TokenType::PasswordReset)
            .unwrap();
        assert_eq!(claims.fp.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let service = service();
        let long_ago = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            - 3600;
        let claims = Claims {
            sub: Uuid::new_v4(),
            iat: long_ago - 900,
            exp: long_ago,
            token_type: TokenType::Access,
            fp: None,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            service.validate_token(&token, TokenType::Access),
            Err(JwtError::Invalid(_))
        ));
    }

    #[test]
    fn test_foreign_signature_is_rejected() {
        let other = JwtService::new(JwtConfig {
            keys: JwtKeys::Secret("other-secret".to_string()),
            access_token_expiry: 900,
        })
        .unwrap();
        let token = other.generate_access_token(Uuid::new_v4()).unwrap();

        assert!(service().validate_token(&token, TokenType::Access).is_err());
    }
}
