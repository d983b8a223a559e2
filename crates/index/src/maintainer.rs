//! Reverse index maintenance.
//!
//! On every canonical save of a source document, the references it now
//! contains are diffed against the references cached on its last save. Only
//! the targets in the difference are touched: added targets gain a usage
//! entry for the source, removed targets lose every entry pointing at it.
//! Finally the new reference set is cached on the source for the next diff.

use crate::error::{ErrorKind, Result};
use crate::options::IndexOptions;
use crate::usage::{add_usage, edit_meta, remove_usage};
use exn::ResultExt;
use reblock_store::{ContentStore, DocumentId, MetaPatch, UsageEntry};
use std::collections::BTreeSet;
use tracing::instrument;

/// The outcome of one [`update_index`] call.
///
/// Every target in the diff ends up in exactly one of the four lists.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexUpdate {
    /// Targets whose reverse index now lists the source.
    pub added: Vec<DocumentId>,
    /// Targets whose reverse index no longer lists the source.
    pub removed: Vec<DocumentId>,
    /// Targets that do not exist. An added-but-missing target stays in the
    /// source's cached references.
    pub missing: Vec<DocumentId>,
    /// Targets that could not be updated. They are left pending and retried
    /// on the next save.
    pub failed: Vec<DocumentId>,
}
impl IndexUpdate {
    /// Returns `true` if the save changed nothing about the source's references.
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.missing.is_empty() && self.failed.is_empty()
    }

    /// Returns `true` if no target was left pending.
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Brings the reverse index in line with a source document's new references.
///
/// `references` is the output of the block extractor for the document that
/// was just saved; repeats count once. The update is idempotent: calling it
/// again with the same references writes nothing.
///
/// Per-target failures do not fail the update. A target that does not exist
/// is skipped. A target that could not be written is left pending: a failed
/// addition is left out of the cached references and a failed removal is
/// kept in them, so the next save sees the same difference again.
///
/// # Errors
/// Returns [`ErrorKind::SourceCache`] if the source's cached references could
/// not be read or written.
#[instrument(skip(store, options, references), fields(store = store.name(), references = references.len()))]
pub async fn update_index(
    store: &dyn ContentStore,
    options: &IndexOptions,
    source: DocumentId,
    kind: &str,
    references: &[DocumentId],
) -> Result<IndexUpdate> {
    let document = store.get(source).await.or_raise(|| ErrorKind::SourceCache(source))?;
    let (cached, old) = distinct(document.meta.references());
    let (references, new) = distinct(references);

    let entry = UsageEntry::new(source, kind);
    let mut update = IndexUpdate::default();

    for &target in references.iter().filter(|id| !old.contains(id)) {
        match add_usage(store, target, &entry, options.max_write_attempts).await {
            Ok(_) => update.added.push(target),
            Err(e) if e.is_not_found() => {
                tracing::debug!(target_id = target, "Referenced document does not exist; skipping");
                update.missing.push(target);
            },
            Err(e) => {
                tracing::warn!(target_id = target, error = ?e, "Failed to add usage entry; will retry on next save");
                update.failed.push(target);
            },
        }
    }

    for &target in cached.iter().filter(|id| !new.contains(id)) {
        match remove_usage(store, target, source, options.max_write_attempts).await {
            Ok(_) => update.removed.push(target),
            Err(e) if e.is_not_found() => {
                tracing::debug!(target_id = target, "Previously referenced document is gone; skipping");
                update.missing.push(target);
            },
            Err(e) => {
                tracing::warn!(target_id = target, error = ?e, "Failed to remove usage entry; will retry on next save");
                update.failed.push(target);
            },
        }
    }

    let failed: BTreeSet<DocumentId> = update.failed.iter().copied().collect();
    let persisted: Vec<DocumentId> = references
        .iter()
        .filter(|id| !failed.contains(id))
        .chain(cached.iter().filter(|id| failed.contains(id) && !new.contains(id)))
        .copied()
        .collect();
    edit_meta(store, source, options.max_write_attempts, |meta| {
        (meta.references() != persisted.as_slice()).then(|| MetaPatch::references(persisted.clone()))
    })
    .await
    .or_raise(|| ErrorKind::SourceCache(source))?;

    tracing::debug!(
        added = update.added.len(),
        removed = update.removed.len(),
        missing = update.missing.len(),
        failed = update.failed.len(),
        "Reverse index updated"
    );
    Ok(update)
}

/// `ids` without repeats, in first-seen order, alongside the same ids as a set.
fn distinct(ids: &[DocumentId]) -> (Vec<DocumentId>, BTreeSet<DocumentId>) {
    let mut seen = BTreeSet::new();
    let ordered = ids.iter().copied().filter(|&id| seen.insert(id)).collect();
    (ordered, seen)
}
