//! Custom error types for the common library
//!
//! This module defines application-specific error types that can be used
//! throughout the application.

use sqlx::Error as SqlxError;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Return the name of the violated constraint when `err` is a unique violation.
///
/// Unique indexes are the source of truth for "at most one" rules, so callers
/// inspect the failed insert rather than checking for existence first.
pub fn unique_violation(err: &SqlxError) -> Option<&str> {
    match err {
        SqlxError::Database(db) if db.is_unique_violation() => {
            Some(db.constraint().unwrap_or_default())
        }
        _ => None,
    }
}

/// Whether `err` reports a row referencing a record that does not exist
pub fn foreign_key_violation(err: &SqlxError) -> bool {
    matches!(err, SqlxError::Database(db) if db.is_foreign_key_violation())
}

/// Custom error type for blob storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Writing to the local filesystem failed
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Uploading to the object store failed
    #[error("Storage upload error: {0}")]
    Upload(String),

    /// The blob path is not a plain relative path
    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    /// Configuration error
    #[error("Storage configuration error: {0}")]
    Configuration(String),
}

/// Custom error type for the mail queue
#[derive(Error, Debug)]
pub enum QueueError {
    /// Redis command failed
    #[error("Queue backend error: {0}")]
    Backend(#[from] redis::RedisError),

    /// Job could not be encoded or decoded
    #[error("Queue payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// The in-process consumer has gone away
    #[error("Queue closed")]
    Closed,
}

/// Custom error type for token issuing and verification
#[derive(Error, Debug)]
pub enum JwtError {
    /// A required key is not configured
    #[error("JWT configuration error: {0}")]
    Configuration(String),

    /// A key could not be parsed
    #[error("Invalid JWT key: {0}")]
    Key(#[source] jsonwebtoken::errors::Error),

    /// Signing failed
    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    /// The token is malformed, expired or has a bad signature
    #[error("Invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),

    /// The token was issued for another purpose
    #[error("Unexpected token type")]
    WrongType,

    /// The system clock is before the Unix epoch
    #[error("System clock error")]
    Clock,
}
