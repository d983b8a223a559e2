//! In-memory content store for testing.

use super::DocumentStream;
use crate::error::{ErrorKind, Result};
use crate::models::{Document, DocumentId, Fields, MetaPatch, Revision, SearchHit, SearchQuery};
use async_stream::stream;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::RwLock;

use crate::ContentStore;

/// In-memory content store for testing.
///
/// Documents are stored in a `BTreeMap` behind a [`RwLock`], so all trait
/// methods can operate on `&self` without external synchronisation, and
/// listings come back in ID order. Metadata writes honour the revision
/// check-and-set contract of [`ContentStore::save_meta`].
///
/// Two hooks make failure paths testable:
/// - [`fail_on`](Self::fail_on) makes every read and write of a document fail
///   with a retryable backend error;
/// - [`interfere`](Self::interfere) applies a patch "from another writer"
///   just before the next write to a document, forcing a revision conflict.
///
/// # Examples
///
/// ```
/// use reblock_store::backend::MockStore;
/// use reblock_store::{ContentStore, Document};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MockStore::with_documents([
///     Document::new(1, "reblock").with_title("Footer").published(),
///     Document::new(2, "page"),
/// ]);
/// assert_eq!(store.get(1).await?.title, "Footer");
/// assert!(store.get(3).await.is_err());
/// # Ok(())
/// # }
/// ```
pub struct MockStore {
    name: String,
    documents: RwLock<BTreeMap<DocumentId, Document>>,
    failing: RwLock<HashSet<DocumentId>>,
    interference: RwLock<HashMap<DocumentId, MetaPatch>>,
}

impl MockStore {
    /// Create a mock store pre-populated with documents.
    ///
    /// Later documents replace earlier ones with the same ID.
    pub fn with_documents(documents: impl IntoIterator<Item = Document>) -> Self {
        Self {
            name: "mock".to_string(),
            documents: RwLock::new(documents.into_iter().map(|doc| (doc.id, doc)).collect()),
            failing: RwLock::default(),
            interference: RwLock::default(),
        }
    }

    /// Change the name of the mock store.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Insert or replace a whole document, as the content system would.
    pub async fn insert(&self, document: Document) {
        self.documents.write().await.insert(document.id, document);
    }

    /// Edit a document's content in place, as an author would, returning
    /// the edited document. Metadata is left alone.
    pub async fn edit(&self, id: DocumentId, f: impl FnOnce(&mut Document)) -> Option<Document> {
        let mut guard = self.documents.write().await;
        let document = guard.get_mut(&id)?;
        f(document);
        Some(document.clone())
    }

    /// Make every read and write of `id` fail until [`heal`](Self::heal)ed.
    pub async fn fail_on(&self, id: DocumentId) {
        self.failing.write().await.insert(id);
    }

    pub async fn heal(&self, id: DocumentId) {
        self.failing.write().await.remove(&id);
    }

    /// Apply `patch` to `id` immediately before the next metadata write to
    /// it, as if a concurrent writer had won the race.
    pub async fn interfere(&self, id: DocumentId, patch: MetaPatch) {
        self.interference.write().await.insert(id, patch);
    }

    async fn check(&self, id: DocumentId) -> Result<()> {
        if self.failing.read().await.contains(&id) {
            exn::bail!(ErrorKind::Backend(format!("injected failure for document {id}")));
        }
        Ok(())
    }
}
impl Default for MockStore {
    fn default() -> Self {
        Self::with_documents([])
    }
}

#[async_trait]
impl ContentStore for MockStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, id: DocumentId) -> Result<Document> {
        self.check(id).await?;
        self.documents.read().await.get(&id).cloned().ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(id)))
    }

    async fn save_meta(&self, id: DocumentId, patch: MetaPatch, expected: Option<Revision>) -> Result<Revision> {
        self.check(id).await?;
        let mut guard = self.documents.write().await;
        let document = guard.get_mut(&id).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(id)))?;
        if let Some(interference) = self.interference.write().await.remove(&id) {
            document.meta.apply(interference);
            document.revision += 1;
        }
        if let Some(expected) = expected
            && expected != document.revision
        {
            exn::bail!(ErrorKind::Conflict {
                id,
                expected,
                actual: document.revision,
            });
        }
        document.meta.apply(patch);
        document.revision += 1;
        Ok(document.revision)
    }

    async fn delete(&self, id: DocumentId) -> Result<()> {
        self.check(id).await?;
        self.documents.write().await.remove(&id).map(|_| ()).ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(id)))
    }

    fn list_stream<'a>(&'a self, kind: &'a str, fields: Fields) -> DocumentStream<'a> {
        Box::pin(stream! {
            // Snapshot matching documents under the read lock, then drop it
            // before yielding to avoid holding the lock across yield points.
            let documents: Vec<Document> = {
                let guard = self.documents.read().await;
                guard.values().filter(|doc| doc.kind == kind).cloned().collect()
            };
            let failing = self.failing.read().await.clone();
            for document in documents {
                if failing.contains(&document.id) {
                    yield Err(exn::Exn::from(ErrorKind::Backend(format!("injected failure for document {}", document.id))));
                } else {
                    yield Ok(document.into_fields(fields));
                }
            }
        })
    }

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>> {
        let guard = self.documents.read().await;
        Ok(guard
            .values()
            .filter(|doc| query.matches(doc))
            .skip(query.page.saturating_sub(1) * query.per_page)
            .take(query.per_page)
            .map(SearchHit::from)
            .collect())
    }
}
