//! Store Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Callers inspect the [`ErrorKind`] through `Deref` to
//! decide whether to retry, skip, or propagate.

use derive_more::{Display, Error};

use crate::models::{DocumentId, Revision};

/// A store error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Document does not exist.
    #[display("document not found: {_0}")]
    NotFound(#[error(not(source))] DocumentId),
    /// Metadata write rejected because the document changed since it was read.
    #[display("revision conflict on document {id}: expected {expected}, found {actual}")]
    Conflict {
        id: DocumentId,
        expected: Revision,
        actual: Revision,
    },
    /// Network-related error (remote content APIs, etc.)
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Backend-specific error
    #[display("backend error: {_0}")]
    Backend(#[error(not(source))] String),
    /// Stored metadata could not be decoded.
    #[display("invalid metadata on document {_0}")]
    InvalidData(#[error(not(source))] DocumentId),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict { .. } | Self::Network(_) | Self::Backend(_))
    }

    /// Returns `true` if the error means the document simply isn't there.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
