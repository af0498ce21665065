//! crates/streaming_catalog_core/src/error.rs
//!
//! The error kinds every core operation can report.

use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Email is already used by another user")]
    DuplicateEmail,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Email and password combination is incorrect")]
    InvalidCredentials,

    #[error("User hasn't watched the movie yet")]
    NotWatched,

    #[error("Rating must be between 1 and 5, got {0}")]
    InvalidRating(i64),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Movie is not owned by current user")]
    Forbidden,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid token")]
    TokenInvalid,

    #[error("Token is expired")]
    TokenExpired,

    #[error("Storage failure during {op}: {message}")]
    StorageFailure { op: &'static str, message: String },

    #[error("Storage timed out during {op}")]
    Timeout { op: &'static str },

    #[error("Storage unavailable during {op}")]
    Unavailable { op: &'static str },
}

impl CatalogError {
    /// Tags a port failure with the operation that produced it.
    pub fn from_port(op: &'static str, err: PortError) -> Self {
        match err {
            PortError::Unavailable(_) => CatalogError::Unavailable { op },
            PortError::Conflict(message) | PortError::Unexpected(message) => {
                CatalogError::StorageFailure { op, message }
            }
        }
    }

    /// True for the kinds that originate in the backing store rather than the caller.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CatalogError::StorageFailure { .. }
                | CatalogError::Timeout { .. }
                | CatalogError::Unavailable { .. }
        )
    }
}

/// A convenience type alias for `Result<T, CatalogError>`.
pub type CatalogResult<T> = Result<T, CatalogError>;
