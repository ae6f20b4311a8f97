//! Errors surfaced by the repository.
//!
//! Every store failure is mapped to one of these kinds at the repository boundary;
//! no SDK error type crosses it.

use thiserror::Error;

/// Errors that can occur during repository operations.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RepositoryError {
    /// The key already exists (create) or the stored version moved on (update).
    #[error("conflict on {table}:{key}")]
    Conflict {
        /// Table the write targeted.
        table: String,
        /// `PK` and `SK` of the record.
        key: String,
    },
    /// No record is stored under the key.
    #[error("not found: {table}:{key}")]
    NotFound {
        /// Table the read targeted.
        table: String,
        /// `PK` and `SK` of the record.
        key: String,
    },
    /// Malformed input or a store-side validation failure.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Transient store failure (throttling, network, timeout). Safe to retry.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Unexpected failure, including records that cannot be decoded.
    #[error("internal error: {0}")]
    Internal(String),
}

impl RepositoryError {
    /// HTTP-equivalent status code of the error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Conflict { .. } => 409,
            Self::NotFound { .. } => 404,
            Self::BadRequest(_) => 400,
            Self::ServiceUnavailable(_) => 503,
            Self::Internal(_) => 500,
        }
    }

    /// Whether the caller may retry the operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_))
    }
}

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, RepositoryError>;
