//! Custom error types for the feed service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use social::SocialError;
use thiserror::Error;
use tracing::error;

/// Custom error type for the feed service
#[derive(Error, Debug)]
pub enum ApiError {
    /// A form field failed validation
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The change collides with existing data
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Unauthorized access
    #[error("Unauthorized")]
    Unauthorized,

    /// Authenticated but not allowed to touch the resource
    #[error("Forbidden")]
    Forbidden,

    #[error("Payload too large")]
    PayloadTooLarge,

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl From<SocialError> for ApiError {
    fn from(err: SocialError) -> Self {
        match err {
            SocialError::Validation { field, message } => ApiError::Validation { field, message },
            SocialError::SelfFollow => ApiError::BadRequest(err.to_string()),
            SocialError::DuplicateUsername
            | SocialError::DuplicateEmail
            | SocialError::UniquenessViolation(_) => ApiError::Conflict(err.to_string()),
            SocialError::NotFound(_) => ApiError::NotFound(err.to_string()),
            SocialError::Credential(_) | SocialError::Storage(_) | SocialError::Database(_) => {
                error!("Request failed: {}", err);
                ApiError::InternalServerError
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "field": field }),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, json!({ "error": "Unauthorized" })),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, json!({ "error": "Forbidden" })),
            ApiError::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                json!({ "error": "Payload too large" }),
            ),
            ApiError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::DatabaseError;

    fn status_of(err: SocialError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_social_error_mapping() {
        assert_eq!(
            status_of(SocialError::validation("text", "too long")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(SocialError::SelfFollow), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(SocialError::DuplicateUsername), StatusCode::CONFLICT);
        assert_eq!(
            status_of(SocialError::UniquenessViolation("like")),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(SocialError::NotFound("post")), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(SocialError::Database(DatabaseError::Configuration(
                "broken".to_string()
            ))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_http_only_errors() {
        assert_eq!(
            ApiError::Unauthorized.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden.into_response().status(),
            StatusCode::FORBIDDEN
        );
    }
}
