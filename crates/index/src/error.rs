//! Index Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Per-target failures never surface here; they are logged
//! and reported in the operation's outcome instead.

use derive_more::{Display, Error};
use reblock_store::DocumentId;

/// An index error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for index operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the origin of an index failure.
///
/// Only failures that leave the source document's own state unrecorded are
/// raised:
/// - [`ErrorKind::Store`]
/// - [`ErrorKind::SourceCache`]
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// A content store read needed to start the operation failed.
    #[display("content store operation failed")]
    Store,
    /// The source document's forward reference cache could not be read or written.
    #[display("failed to record references for document {_0}")]
    SourceCache(#[error(not(source))] DocumentId),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// A failed reference cache is picked up again on the next canonical save.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::SourceCache(_))
    }
}
