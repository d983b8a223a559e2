//! Deletion cascade.
//!
//! A deleted document may be listed in the reverse index of any block. There
//! is no index from a document to the blocks listing it other than its own
//! cached references, which can be stale, so every block is scanned.

use crate::options::IndexOptions;
use crate::usage::{Edit, remove_usage};
use futures::StreamExt;
use reblock_store::{ContentStore, DocumentId, Fields};
use tracing::instrument;

/// The outcome of one [`purge_usage`] call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    /// Blocks inspected.
    pub scanned: usize,
    /// Blocks whose reverse index no longer lists the deleted document.
    pub updated: Vec<DocumentId>,
    /// Blocks that listed the deleted document but could not be written.
    pub failed: Vec<DocumentId>,
    /// Blocks the listing could not load.
    pub unreadable: usize,
}
impl CascadeReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty() && self.unreadable == 0
    }
}

/// Removes every reverse index entry pointing at `deleted` from all documents
/// of type `kind`, deleting the field where nothing is left.
///
/// Meant to run before the document itself is deleted; the deleted document's
/// own metadata is left alone. Failures are logged, reported and skipped.
#[instrument(skip(store, options), fields(store = store.name()))]
pub async fn purge_usage(
    store: &dyn ContentStore,
    options: &IndexOptions,
    kind: &str,
    deleted: DocumentId,
) -> CascadeReport {
    let mut report = CascadeReport::default();
    let mut blocks = store.list_stream(kind, Fields::Meta);
    while let Some(item) = blocks.next().await {
        let block = match item {
            Ok(block) => block,
            Err(e) => {
                tracing::warn!(error = ?e, "Failed to load document during deletion cascade; skipping");
                report.unreadable += 1;
                continue;
            },
        };
        report.scanned += 1;
        if block.id == deleted || !block.meta.used_in().iter().any(|entry| entry.id == deleted) {
            continue;
        }
        match remove_usage(store, block.id, deleted, options.max_write_attempts).await {
            Ok(Edit::Written(_)) => report.updated.push(block.id),
            Ok(Edit::Unchanged) => {},
            Err(e) if e.is_not_found() => {
                tracing::debug!(document = block.id, "Document disappeared during deletion cascade");
            },
            Err(e) => {
                tracing::warn!(document = block.id, error = ?e, "Failed to purge usage entry; skipping");
                report.failed.push(block.id);
            },
        }
    }
    tracing::debug!(
        scanned = report.scanned,
        updated = report.updated.len(),
        failed = report.failed.len(),
        unreadable = report.unreadable,
        "Deletion cascade finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use reblock_store::backend::MockStore;
    use reblock_store::{Document, Metadata, UsageEntry};

    fn block(id: DocumentId, used_in: &[DocumentId]) -> Document {
        Document::new(id, "reblock").with_meta(Metadata {
            used_in: Some(used_in.iter().map(|&id| UsageEntry::new(id, "page")).collect()),
            references: None,
        })
    }

    #[tokio::test]
    async fn test_purges_every_block() {
        let store = MockStore::with_documents([
            block(1, &[10]),
            block(2, &[10, 11]),
            block(3, &[11]),
            Document::new(10, "page"),
        ]);
        let report = purge_usage(&store, &IndexOptions::default(), "reblock", 10).await;
        assert_eq!(report.scanned, 3);
        assert_eq!(report.updated, vec![1, 2]);
        assert!(report.is_complete());
        assert_eq!(store.get(1).await.unwrap().meta.used_in, None);
        assert_eq!(store.get(2).await.unwrap().meta.used_in(), [UsageEntry::new(11, "page")]);
        assert_eq!(store.get(3).await.unwrap().revision, 0);
    }

    #[tokio::test]
    async fn test_failures_are_skipped() {
        let store = MockStore::with_documents([block(1, &[10]), block(2, &[10]), block(3, &[10])]);
        store.fail_on(2).await;
        let report = purge_usage(&store, &IndexOptions::default(), "reblock", 10).await;
        assert_eq!(report.updated, vec![1, 3]);
        assert_eq!(report.unreadable, 1);
        assert!(!report.is_complete());
        store.heal(2).await;
        assert_eq!(store.get(2).await.unwrap().meta.used_in(), [UsageEntry::new(10, "page")]);
    }

    #[tokio::test]
    async fn test_deleted_block_is_left_alone() {
        let store = MockStore::with_documents([block(1, &[1, 2]), block(2, &[1])]);
        let report = purge_usage(&store, &IndexOptions::default(), "reblock", 1).await;
        assert_eq!(report.updated, vec![2]);
        assert_eq!(store.get(1).await.unwrap().revision, 0);
    }
}
