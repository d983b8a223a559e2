use crate::cascade::{CascadeReport, purge_usage};
use crate::error::{ErrorKind, Result};
use crate::exclusion::{ExclusionSet, exclusion_set};
use crate::maintainer::{IndexUpdate, update_index};
use crate::options::{ExclusionOptions, IndexOptions, SearchOptions};
use exn::ResultExt;
use reblock_blocks::{BlockOptions, extract_reference_ids};
use reblock_store::backend::ReadOnlyStore;
use reblock_store::{Document, DocumentId, SearchHit, SearchQuery, StoreHandle, UsageEntry};
use std::sync::Arc;
use tracing::instrument;

/// How the content system saved a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveKind {
    /// A deliberate save by the author.
    #[default]
    Canonical,
    /// A periodic background save of unsaved changes.
    Autosave,
    /// A history snapshot of an earlier state.
    Revision,
}
impl SaveKind {
    pub fn is_canonical(self) -> bool {
        matches!(self, Self::Canonical)
    }
}

/// Entry point for reference tracking on one content store.
///
/// Owns the store handle and every tuning option; each content system event
/// maps onto one method.
#[derive(Clone)]
pub struct Tracker {
    store: StoreHandle,
    blocks: BlockOptions,
    index: IndexOptions,
    exclusion: ExclusionOptions,
    search: SearchOptions,
}
impl Tracker {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            blocks: BlockOptions::default(),
            index: IndexOptions::default(),
            exclusion: ExclusionOptions::default(),
            search: SearchOptions::default(),
        }
    }

    pub fn with_blocks(mut self, blocks: BlockOptions) -> Self {
        self.blocks = blocks;
        self
    }

    /// Replaces the index options. A dry run puts the store behind a
    /// [`ReadOnlyStore`].
    pub fn with_index(mut self, index: IndexOptions) -> Self {
        if index.dry_run {
            self.store = Arc::new(ReadOnlyStore::new(self.store));
        }
        self.index = index;
        self
    }

    pub fn with_exclusion(mut self, exclusion: ExclusionOptions) -> Self {
        self.exclusion = exclusion;
        self
    }

    pub fn with_search(mut self, search: SearchOptions) -> Self {
        self.search = search;
        self
    }

    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    pub fn blocks(&self) -> &BlockOptions {
        &self.blocks
    }

    /// Updates the reverse index after `document` was saved.
    ///
    /// Only canonical saves are tracked; autosaves and revisions return
    /// `Ok(None)` without touching the store.
    #[instrument(skip(self, document), fields(document = document.id, kind = %document.kind))]
    pub async fn document_saved(&self, document: &Document, save: SaveKind) -> Result<Option<IndexUpdate>> {
        if !save.is_canonical() {
            tracing::trace!(?save, "Not a canonical save; references left as they are");
            return Ok(None);
        }
        let references = extract_reference_ids(&document.content, &self.blocks);
        update_index(self.store.as_ref(), &self.index, document.id, &document.kind, &references).await.map(Some)
    }

    /// Purges `id` from every block's reverse index.
    ///
    /// Call before the document is removed from the content system.
    pub async fn document_deleted(&self, id: DocumentId) -> CascadeReport {
        purge_usage(self.store.as_ref(), &self.index, &self.blocks.post_type, id).await
    }

    /// Purges `id` from every block's reverse index, then deletes it.
    pub async fn delete_document(&self, id: DocumentId) -> Result<CascadeReport> {
        let report = self.document_deleted(id).await;
        self.store.delete(id).await.or_raise(|| ErrorKind::Store)?;
        Ok(report)
    }

    /// Documents currently embedding the block `id`.
    ///
    /// A document that does not exist is used nowhere.
    pub async fn used_in(&self, id: DocumentId) -> Result<Vec<UsageEntry>> {
        match self.store.get(id).await {
            Ok(document) => Ok(document.meta.used_in.unwrap_or_default()),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e).or_raise(|| ErrorKind::Store),
        }
    }

    /// Documents that must not be offered as embed targets for `candidate`.
    pub async fn exclusion_set(&self, candidate: DocumentId) -> ExclusionSet {
        self.exclusion_set_with(candidate, &[]).await
    }

    /// Like [`exclusion_set()`](Self::exclusion_set), also following
    /// references the candidate holds but has not saved yet.
    pub async fn exclusion_set_with(&self, candidate: DocumentId, local: &[DocumentId]) -> ExclusionSet {
        exclusion_set(self.store.as_ref(), &self.exclusion, candidate, local).await
    }

    /// Published blocks whose title contains `query` that `candidate` may
    /// embed, one page (1-based) at a time.
    ///
    /// Results are filtered by an exclusion walk using
    /// [`SearchOptions::traversal`] rather than the exclusion options' own,
    /// so by default neither the blocks the candidate embeds nor the blocks
    /// embedding it are offered.
    #[instrument(skip(self))]
    pub async fn selectable_targets(&self, candidate: DocumentId, query: &str, page: usize) -> Result<Vec<SearchHit>> {
        let options = ExclusionOptions {
            traversal: self.search.traversal,
            ..self.exclusion.clone()
        };
        let excluded = exclusion_set(self.store.as_ref(), &options, candidate, &[]).await;
        let query = SearchQuery::new(&self.blocks.post_type, query)
            .excluding(excluded.into_ids())
            .page(page, self.search.per_page);
        self.store.search(&query).await.or_raise(|| ErrorKind::Store)
    }
}
