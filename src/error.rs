//! Error types for lessongate
//!
//! The access check itself never fails. Everything here belongs to a
//! boundary: parsing untyped input, or the profile store.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("unknown role: {0}")]
    UnknownRole(String),

    #[error("unknown resource: {0}")]
    UnknownResource(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("malformed permission (expected resource:action): {0}")]
    MalformedPermission(String),

    #[error("no profile for user {0}")]
    UnknownUser(String),

    #[error("profile already exists for user {0}")]
    UserExists(String),

    #[error("invalid user id (must be 1..=511 bytes): {0:?}")]
    InvalidUserId(String),

    #[error("{role} lacks {permission}")]
    Forbidden { role: String, permission: String },

    #[error("corrupted profile record: {0}")]
    Corrupted(String),

    #[error("store error: {0}")]
    Store(String),
}

/// Result type alias for lessongate operations
pub type Result<T> = std::result::Result<T, GateError>;

/// Convert a storage-layer error into GateError
pub fn err<E: std::error::Error>(e: E) -> GateError {
    GateError::Store(e.to_string())
}
