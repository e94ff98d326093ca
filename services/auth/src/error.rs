//! Custom error types for the authentication service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use social::SocialError;
use thiserror::Error;
use tracing::error;

/// Custom error type for authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Wrong credentials
    #[error("Unauthorized")]
    Unauthorized,

    /// Valid credentials for an account that may not log in
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Internal server error")]
    InternalServerError,
}

impl From<SocialError> for AuthError {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::Validation { field, message } => AuthError::Validation { field, message },
            SocialError::SelfFollow => AuthError::BadRequest(err.to_string()),
            SocialError::DuplicateUsername
            | SocialError::DuplicateEmail
            | SocialError::UniquenessViolation(_) => AuthError::Conflict(err.to_string()),
            SocialError::NotFound(_) => AuthError::NotFound(err.to_string()),
            SocialError::Credential(_) | SocialError::Storage(_) | SocialError::Database(_) => {
                error!("Request failed: {}", err);
                AuthError::InternalServerError
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AuthError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "field": field }),
            ),
            AuthError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AuthError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            AuthError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AuthError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "Invalid username or password" }),
            ),
            AuthError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AuthError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({ "error": "Too many login attempts, try again later" }),
            ),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AuthError::from(SocialError::DuplicateEmail).into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AuthError::from(SocialError::validation("password2", "mismatch"))
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AuthError::TooManyRequests.into_response().status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            AuthError::Forbidden("inactive".to_string()).into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
