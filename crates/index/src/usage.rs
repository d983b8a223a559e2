//! Check-and-set metadata edits.
//!
//! Every reverse index change is a read-modify-write of one document's
//! metadata. The write carries the revision that was read, so a concurrent
//! writer makes it fail with a conflict instead of being silently
//! overwritten; the edit is then re-applied to a fresh read.

use reblock_store::error::{ErrorKind as StoreErrorKind, Result as StoreResult};
use reblock_store::{ContentStore, DocumentId, MetaPatch, Metadata, Revision, UsageEntry};
use std::ops::Deref;

/// The outcome of a single metadata edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Edit {
    /// The edit had nothing to change; no write was issued.
    Unchanged,
    /// The edit was persisted at the given revision.
    Written(Revision),
}

/// Re-reads `id`, asks `edit` for a patch and writes it back with the read
/// revision, retrying on conflict up to `attempts` times in total.
///
/// `edit` returning `None` means the metadata is already as desired.
pub(crate) async fn edit_meta<F>(store: &dyn ContentStore, id: DocumentId, attempts: u32, edit: F) -> StoreResult<Edit>
where
    F: Fn(&Metadata) -> Option<MetaPatch>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        let document = store.get(id).await?;
        let Some(patch) = edit(&document.meta) else {
            return Ok(Edit::Unchanged);
        };
        match store.save_meta(id, patch, Some(document.revision)).await {
            Ok(revision) => return Ok(Edit::Written(revision)),
            Err(e) if matches!(e.deref(), StoreErrorKind::Conflict { .. }) && attempt < attempts => {
                tracing::debug!(document = id, attempt, "Metadata changed since it was read; retrying");
                attempt += 1;
            },
            Err(e) => return Err(e),
        }
    }
}

/// Appends `entry` to the reverse index of `target` unless already present.
pub(crate) async fn add_usage(
    store: &dyn ContentStore,
    target: DocumentId,
    entry: &UsageEntry,
    attempts: u32,
) -> StoreResult<Edit> {
    edit_meta(store, target, attempts, |meta| {
        let used_in = meta.used_in();
        if used_in.contains(entry) {
            return None;
        }
        let mut next = used_in.to_vec();
        next.push(entry.clone());
        Some(MetaPatch::used_in(next))
    })
    .await
}

/// Drops every reverse index entry of `target` that points at `source`,
/// deleting the field when nothing is left.
pub(crate) async fn remove_usage(
    store: &dyn ContentStore,
    target: DocumentId,
    source: DocumentId,
    attempts: u32,
) -> StoreResult<Edit> {
    edit_meta(store, target, attempts, |meta| {
        let used_in = meta.used_in();
        if !used_in.iter().any(|entry| entry.id == source) {
            return None;
        }
        Some(MetaPatch::used_in(used_in.iter().filter(|entry| entry.id != source).cloned().collect()))
    })
    .await
}
