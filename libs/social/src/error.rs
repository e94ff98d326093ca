//! Error taxonomy for the social core

use common::error::{DatabaseError, StorageError};
use thiserror::Error;

/// Errors returned by the core operations
#[derive(Error, Debug)]
pub enum SocialError {
    /// A form field is missing or malformed
    #[error("{field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// The username is already registered
    #[error("A user with that username already exists")]
    DuplicateUsername,

    /// The email is already registered
    #[error("A user with that email already exists")]
    DuplicateEmail,

    /// Another uniqueness rule was violated (follow edge, like, slug)
    #[error("Duplicate {0}")]
    UniquenessViolation(&'static str),

    /// The referenced record does not exist
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An identity tried to toggle its own follow edge
    #[error("You cannot follow yourself")]
    SelfFollow,

    /// Password hashing or verification failed
    #[error("Credential error: {0}")]
    Credential(String),

    /// Blob storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Database failure
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl SocialError {
    /// Shorthand for a field validation error
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        SocialError::Validation {
            field,
            message: message.into(),
        }
    }
}

/// Type alias for Result with SocialError
pub type SocialResult<T> = Result<T, SocialError>;
