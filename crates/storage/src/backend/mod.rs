//! Content store trait and implementations.
//!
//! This module defines the [`ContentStore`] trait, the reference tracker's
//! only window onto the external content system: fetch a document, write
//! metadata back to it, enumerate documents of a type, and search titles.

#[cfg(feature = "mock")]
mod mock;
mod ro;

#[cfg(feature = "mock")]
pub use self::mock::MockStore;
pub use self::ro::ReadOnlyStore;
use crate::error::Result;
use crate::models::{Document, DocumentId, Fields, MetaPatch, Revision, SearchHit, SearchQuery};
use async_trait::async_trait;
use futures::{Stream, TryStreamExt};
use std::pin::Pin;

pub(crate) type DocumentStream<'a> = Pin<Box<dyn Stream<Item = Result<Document>> + Send + 'a>>;

/// Unified interface onto an external content system.
///
/// Documents themselves are never written through this trait; only the
/// reference-tracking [`Metadata`](crate::Metadata) attached to them is.
/// Every metadata write may carry the [`Revision`] the caller read, making
/// read-modify-write cycles check-and-set: implementations must reject a
/// stale write with [`Conflict`](crate::error::ErrorKind::Conflict).
///
/// # Examples
///
/// ```
/// use reblock_store::{ContentStore, DocumentId, MetaPatch, UsageEntry, error::Result};
///
/// async fn record_usage(store: &dyn ContentStore, block: DocumentId, page: DocumentId) -> Result<()> {
///     let document = store.get(block).await?;
///     let mut used_in = document.meta.used_in().to_vec();
///     used_in.push(UsageEntry::new(page, "page"));
///     store.save_meta(block, MetaPatch::used_in(used_in), Some(document.revision)).await?;
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Name of the configured store (used for logging only).
    fn name(&self) -> &str;

    /// Fetch a document.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// document does not exist.
    async fn get(&self, id: DocumentId) -> Result<Document>;

    /// Persist metadata changes on a document, returning its new revision.
    ///
    /// When `expected` is given and differs from the document's current
    /// revision, nothing is written and
    /// [`Conflict`](crate::error::ErrorKind::Conflict) is returned.
    ///
    /// # Notes
    /// - Empty sequences must be stored as absent fields (see
    ///   [`Metadata::apply`](crate::Metadata::apply)).
    async fn save_meta(&self, id: DocumentId, patch: MetaPatch, expected: Option<Revision>) -> Result<Revision>;

    /// Delete a document.
    ///
    /// Returns [`NotFound`](crate::error::ErrorKind::NotFound) if the
    /// document does not exist.
    async fn delete(&self, id: DocumentId) -> Result<()>;

    /// Stream every document of the given type.
    ///
    /// Items are yielded as they are fetched; a failed item does not end the
    /// stream, so callers may skip it and carry on.
    fn list_stream<'a>(&'a self, kind: &'a str, fields: Fields) -> DocumentStream<'a>;

    /// List every document of the given type.
    ///
    /// Default implementation collects [`list_stream()`](Self::list_stream)
    /// into a [`Vec`], failing on the first failed item.
    async fn list(&self, kind: &str, fields: Fields) -> Result<Vec<Document>> {
        self.list_stream(kind, fields).try_collect().await
    }

    /// Search published documents by title.
    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>>;
}
