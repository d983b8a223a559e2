//! Read-only content store.
//!
//! Wraps another store and prevents metadata writes and deletions from
//! executing, while indicating success on return. Used for dry runs.

use async_trait::async_trait;

use crate::backend::DocumentStream;
use crate::error::Result;
use crate::models::{Document, DocumentId, Fields, MetaPatch, Revision, SearchHit, SearchQuery};
use crate::{ContentStore, StoreHandle};

/// Read-only content store.
///
/// Wraps another store and silently drops all write operations, logging an
/// [`info event`](tracing::Event).
#[derive(Clone)]
pub struct ReadOnlyStore {
    inner: StoreHandle,
}
impl ReadOnlyStore {
    pub fn new(inner: StoreHandle) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ContentStore for ReadOnlyStore {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn get(&self, id: DocumentId) -> Result<Document> {
        self.inner.get(id).await
    }

    async fn save_meta(&self, id: DocumentId, patch: MetaPatch, _expected: Option<Revision>) -> Result<Revision> {
        tracing::info!(store = self.name(), id, ?patch, "Skipping metadata write during read-only mode");
        // Report the revision the write would have been applied to.
        Ok(self.inner.get(id).await?.revision)
    }

    async fn delete(&self, id: DocumentId) -> Result<()> {
        tracing::info!(store = self.name(), id, "Skipping delete during read-only mode");
        Ok(())
    }

    fn list_stream<'a>(&'a self, kind: &'a str, fields: Fields) -> DocumentStream<'a> {
        self.inner.list_stream(kind, fields)
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        self.inner.search(query).await
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::backend::MockStore;
    use crate::models::UsageEntry;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_writes_are_dropped() {
        let inner = Arc::new(MockStore::with_documents([Document::new(1, "reblock")]));
        let store = ReadOnlyStore::new(inner.clone());
        let revision = store.save_meta(1, MetaPatch::used_in(vec![UsageEntry::new(2, "page")]), None).await.unwrap();
        assert_eq!(revision, 0);
        store.delete(1).await.unwrap();
        let document = inner.get(1).await.unwrap();
        assert_eq!(document.meta.used_in, None);
        assert_eq!(document.revision, 0);
    }

    #[tokio::test]
    async fn test_reads_pass_through() {
        let inner = Arc::new(MockStore::with_documents([
            Document::new(1, "reblock").with_title("Alpha").published(),
            Document::new(2, "page"),
        ]));
        let store = ReadOnlyStore::new(inner);
        assert_eq!(store.get(2).await.unwrap().kind, "page");
        assert_eq!(store.list("reblock", Fields::Meta).await.unwrap().len(), 1);
        assert_eq!(store.search(&SearchQuery::new("reblock", "alp")).await.unwrap().len(), 1);
    }
}
