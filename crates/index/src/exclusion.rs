//! Cycle exclusion.
//!
//! Before a document is offered as an embed target for a candidate, the
//! candidate's reference graph is walked breadth-first from the candidate.
//! Everything reached is excluded. The walk reads only cached metadata,
//! never content, and is bounded by a node count and a wall-clock budget.

use crate::options::{ExclusionOptions, Overrun, Traversal};
use reblock_store::{ContentStore, Document, DocumentId};
use std::collections::{BTreeSet, VecDeque};
use std::ops::Deref;
use std::time::Instant;
use tracing::instrument;

/// Which part of the walk budget ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Budget {
    Nodes,
    Time,
}

/// Documents that must not be offered as embed targets for a candidate.
///
/// Always contains the candidate itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    ids: BTreeSet<DocumentId>,
    exhausted: Option<Budget>,
    skipped: Vec<DocumentId>,
}
impl ExclusionSet {
    pub fn contains(&self, id: DocumentId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &BTreeSet<DocumentId> {
        &self.ids
    }

    pub fn into_ids(self) -> BTreeSet<DocumentId> {
        self.ids
    }

    /// Returns `true` if the walk finished within its budget.
    pub fn is_complete(&self) -> bool {
        self.exhausted.is_none()
    }

    /// The budget that cut the walk short, if any.
    pub fn exhausted(&self) -> Option<Budget> {
        self.exhausted
    }

    /// Documents whose metadata could not be read; their branches were not
    /// followed.
    pub fn skipped(&self) -> &[DocumentId] {
        &self.skipped
    }
}
impl Deref for ExclusionSet {
    type Target = BTreeSet<DocumentId>;

    fn deref(&self) -> &Self::Target {
        &self.ids
    }
}

/// Computes the exclusion set of `candidate`.
///
/// `local` carries references the candidate holds but has not saved yet
/// (for example, blocks already inserted in an open editor). They are
/// treated like cached references.
///
/// The walk fails open: a document that cannot be read is logged and its
/// branch is not expanded, and a document that does not exist has no edges.
/// When the budget runs out the result is degraded according to
/// [`ExclusionOptions::on_overrun`].
#[instrument(skip(store, options, local), fields(store = store.name(), traversal = ?options.traversal))]
pub async fn exclusion_set(
    store: &dyn ContentStore,
    options: &ExclusionOptions,
    candidate: DocumentId,
    local: &[DocumentId],
) -> ExclusionSet {
    let started = Instant::now();
    let timeout = options.timeout();
    let mut skipped = Vec::new();

    let mut direct = BTreeSet::from([candidate]);
    if options.traversal.outgoing() {
        direct.extend(local.iter().copied());
    }
    if let Some(document) = fetch(store, candidate, &mut skipped).await {
        direct.extend(neighbours(&document, options.traversal));
    }

    let mut visited = direct.clone();
    let mut queue: VecDeque<DocumentId> = direct.iter().copied().filter(|&id| id != candidate).collect();
    let degrade = |visited: BTreeSet<DocumentId>, skipped: Vec<DocumentId>, budget: Budget| {
        tracing::warn!(?budget, visited = visited.len(), policy = ?options.on_overrun, "Exclusion walk over budget");
        let ids = match options.on_overrun {
            Overrun::ExcludeNothing => BTreeSet::from([candidate]),
            Overrun::DirectOnly => direct.clone(),
            Overrun::Partial => visited,
        };
        ExclusionSet {
            ids,
            exhausted: Some(budget),
            skipped,
        }
    };
    if visited.len() > options.max_nodes {
        return degrade(visited, skipped, Budget::Nodes);
    }

    while let Some(id) = queue.pop_front() {
        if started.elapsed() >= timeout {
            return degrade(visited, skipped, Budget::Time);
        }
        let Some(document) = fetch(store, id, &mut skipped).await else {
            continue;
        };
        for next in neighbours(&document, options.traversal) {
            if visited.contains(&next) {
                continue;
            }
            if visited.len() >= options.max_nodes {
                return degrade(visited, skipped, Budget::Nodes);
            }
            visited.insert(next);
            queue.push_back(next);
        }
    }

    tracing::trace!(excluded = visited.len(), "Exclusion walk complete");
    ExclusionSet {
        ids: visited,
        exhausted: None,
        skipped,
    }
}

async fn fetch(store: &dyn ContentStore, id: DocumentId, skipped: &mut Vec<DocumentId>) -> Option<Document> {
    match store.get(id).await {
        Ok(document) => Some(document),
        Err(e) if e.is_not_found() => {
            tracing::trace!(document = id, "Document does not exist; no edges to follow");
            None
        },
        Err(e) => {
            tracing::warn!(document = id, error = ?e, "Failed to read document; not following its references");
            skipped.push(id);
            None
        },
    }
}

fn neighbours(document: &Document, traversal: Traversal) -> Vec<DocumentId> {
    let mut ids = Vec::new();
    if traversal.outgoing() {
        ids.extend_from_slice(document.meta.references());
    }
    if traversal.incoming() {
        ids.extend(document.meta.used_in().iter().map(|entry| entry.id));
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use reblock_store::backend::MockStore;
    use reblock_store::{Metadata, UsageEntry};
    use rstest::rstest;

    /// Builds a store from `(id, references)` pairs with a consistent reverse index.
    fn graph(edges: &[(DocumentId, Vec<DocumentId>)]) -> MockStore {
        let documents = edges.iter().map(|(id, references)| {
            let used_in: Vec<UsageEntry> = edges
                .iter()
                .filter(|(_, refs)| refs.contains(id))
                .map(|(source, _)| UsageEntry::new(*source, "reblock"))
                .collect();
            Document::new(*id, "reblock").with_meta(Metadata {
                used_in: (!used_in.is_empty()).then_some(used_in),
                references: (!references.is_empty()).then(|| references.clone()),
            })
        });
        MockStore::with_documents(documents)
    }

    fn ids(set: &ExclusionSet) -> Vec<DocumentId> {
        set.iter().copied().collect()
    }

    #[rstest]
    #[case::head(1, vec![1, 2, 3])]
    #[case::middle(2, vec![2, 3])]
    #[case::tail(3, vec![3])]
    #[tokio::test]
    async fn test_outgoing_chain(#[case] candidate: DocumentId, #[case] expected: Vec<DocumentId>) {
        let store = graph(&[(1, vec![2]), (2, vec![3]), (3, vec![])]);
        let set = exclusion_set(&store, &ExclusionOptions::default(), candidate, &[]).await;
        assert_eq!(ids(&set), expected);
        assert!(set.is_complete());
    }

    #[rstest]
    #[case::incoming(Traversal::Incoming, 3, vec![1, 2, 3])]
    #[case::incoming_head(Traversal::Incoming, 1, vec![1])]
    #[case::both(Traversal::Both, 2, vec![1, 2, 3])]
    #[tokio::test]
    async fn test_traversal(#[case] traversal: Traversal, #[case] candidate: DocumentId, #[case] expected: Vec<DocumentId>) {
        let store = graph(&[(1, vec![2]), (2, vec![3]), (3, vec![])]);
        let options = ExclusionOptions {
            traversal,
            ..ExclusionOptions::default()
        };
        assert_eq!(ids(&exclusion_set(&store, &options, candidate, &[]).await), expected);
    }

    #[tokio::test]
    async fn test_self_is_always_excluded() {
        let store = MockStore::default();
        let set = exclusion_set(&store, &ExclusionOptions::default(), 42, &[]).await;
        assert_eq!(ids(&set), vec![42]);
        assert!(set.contains(42));
    }

    #[tokio::test]
    async fn test_existing_cycle_terminates() {
        let store = graph(&[(1, vec![2]), (2, vec![3]), (3, vec![1])]);
        let set = exclusion_set(&store, &ExclusionOptions::default(), 2, &[]).await;
        assert_eq!(ids(&set), vec![1, 2, 3]);
        assert!(set.is_complete());
    }

    #[tokio::test]
    async fn test_local_references_are_followed() {
        let store = graph(&[(1, vec![]), (5, vec![6]), (6, vec![])]);
        let set = exclusion_set(&store, &ExclusionOptions::default(), 1, &[5]).await;
        assert_eq!(ids(&set), vec![1, 5, 6]);
    }

    #[tokio::test]
    async fn test_unreadable_branch_is_not_followed() {
        let store = graph(&[(1, vec![2, 4]), (2, vec![3]), (3, vec![]), (4, vec![5]), (5, vec![])]);
        store.fail_on(2).await;
        let set = exclusion_set(&store, &ExclusionOptions::default(), 1, &[]).await;
        assert_eq!(ids(&set), vec![1, 2, 4, 5]);
        assert_eq!(set.skipped(), [2]);
        assert!(set.is_complete());
    }

    #[tokio::test]
    async fn test_missing_reference_has_no_edges() {
        let store = graph(&[(1, vec![99])]);
        let set = exclusion_set(&store, &ExclusionOptions::default(), 1, &[]).await;
        assert_eq!(ids(&set), vec![1, 99]);
        assert!(set.skipped().is_empty());
    }

    #[rstest]
    #[case::exclude_nothing(Overrun::ExcludeNothing, vec![1])]
    #[case::direct_only(Overrun::DirectOnly, vec![1, 2])]
    #[case::partial(Overrun::Partial, vec![1, 2, 3])]
    #[tokio::test]
    async fn test_node_budget(#[case] on_overrun: Overrun, #[case] expected: Vec<DocumentId>) {
        let store = graph(&[(1, vec![2]), (2, vec![3]), (3, vec![4]), (4, vec![5]), (5, vec![])]);
        let options = ExclusionOptions {
            max_nodes: 3,
            on_overrun,
            ..ExclusionOptions::default()
        };
        let set = exclusion_set(&store, &options, 1, &[]).await;
        assert_eq!(ids(&set), expected);
        assert_eq!(set.exhausted(), Some(Budget::Nodes));
    }

    #[tokio::test]
    async fn test_time_budget() {
        let store = graph(&[(1, vec![2]), (2, vec![3]), (3, vec![])]);
        let options = ExclusionOptions {
            timeout_ms: 0,
            ..ExclusionOptions::default()
        };
        let set = exclusion_set(&store, &options, 1, &[]).await;
        assert_eq!(ids(&set), vec![1, 2]);
        assert_eq!(set.exhausted(), Some(Budget::Time));
        assert!(!set.is_complete());
    }

    #[tokio::test]
    async fn test_budget_not_hit_by_leaf() {
        let store = graph(&[(1, vec![])]);
        let options = ExclusionOptions {
            max_nodes: 1,
            timeout_ms: 0,
            ..ExclusionOptions::default()
        };
        assert!(exclusion_set(&store, &options, 1, &[]).await.is_complete());
    }
}
