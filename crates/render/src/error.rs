//! Render Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. A block that cannot be shown is not an error; a
//! content store failure or unwritable markup is.

use derive_more::{Display, Error};

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The embedded document could not be fetched.
    #[display("failed to fetch embedded document")]
    Store,
    /// Generated markup could not be written out.
    #[display("failed to write HTML markup")]
    Markup,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Store)
    }
}
