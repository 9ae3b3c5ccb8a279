//! Error types raised by repository implementations.

use thiserror::Error;

/// Errors surfaced by repository implementations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("repository lock was poisoned")]
    LockPoisoned,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("no authenticated user")]
    Unauthenticated,

    /// A user or snapshot id that cannot be used as a storage key.
    #[error("invalid storage key: {0:?}")]
    InvalidKey(String),
}

impl From<serde_json::Error> for RepositoryError {
    fn from(err: serde_json::Error) -> Self {
        RepositoryError::Json(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
