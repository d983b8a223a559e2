//! Document and metadata models.
//!
//! These types describe externally-owned documents as the reference tracker
//! sees them, and the two metadata fields it maintains on them.

use reblock_blocks::{Node, parse};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Unique document identifier assigned by the content system.
pub type DocumentId = u64;
/// Metadata version stamp, incremented on every successful metadata write.
pub type Revision = u64;

/// Publication state of a document.
///
/// Only [`Published`](Self::Published) documents are valid embed targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Published,
    /// Anything else the content system knows about (pending, private, trash).
    #[serde(untagged)]
    Other(String),
}
impl DocumentStatus {
    pub fn is_published(&self) -> bool {
        matches!(self, Self::Published)
    }
}

/// One entry in a block's reverse index: a document that embeds it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageEntry {
    pub id: DocumentId,
    #[serde(rename = "type")]
    pub kind: String,
}
impl UsageEntry {
    pub fn new(id: DocumentId, kind: impl Into<String>) -> Self {
        Self { id, kind: kind.into() }
    }
}

/// Reference-tracking metadata persisted on a document.
///
/// Both fields are tri-state on the wire but never present-and-empty: an
/// absent field means "nothing recorded".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Documents currently embedding this one (reverse index).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_in: Option<Vec<UsageEntry>>,
    /// Documents this one embedded as of its last canonical save (forward cache).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<DocumentId>>,
}
impl Metadata {
    /// Applies a patch, normalising empty sequences to absent fields.
    pub fn apply(&mut self, patch: MetaPatch) {
        patch.used_in.apply(&mut self.used_in);
        patch.references.apply(&mut self.references);
        if self.used_in.as_ref().is_some_and(Vec::is_empty) {
            self.used_in = None;
        }
        if self.references.as_ref().is_some_and(Vec::is_empty) {
            self.references = None;
        }
    }

    pub fn used_in(&self) -> &[UsageEntry] {
        self.used_in.as_deref().unwrap_or_default()
    }

    pub fn references(&self) -> &[DocumentId] {
        self.references.as_deref().unwrap_or_default()
    }
}

/// A single-field metadata change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the field as it is.
    #[default]
    Keep,
    /// Replace the field's value.
    Set(T),
    /// Remove the field entirely.
    Delete,
}
impl<T> Patch<T> {
    fn apply(self, field: &mut Option<T>) {
        match self {
            Self::Keep => {},
            Self::Set(value) => *field = Some(value),
            Self::Delete => *field = None,
        }
    }

    pub fn is_keep(&self) -> bool {
        matches!(self, Self::Keep)
    }
}
impl<T> Patch<Vec<T>> {
    /// `Set` for a non-empty sequence, `Delete` for an empty one.
    pub fn from_vec(values: Vec<T>) -> Self {
        match values.is_empty() {
            true => Self::Delete,
            false => Self::Set(values),
        }
    }
}

/// Metadata changes to persist on one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetaPatch {
    pub used_in: Patch<Vec<UsageEntry>>,
    pub references: Patch<Vec<DocumentId>>,
}
impl MetaPatch {
    pub fn used_in(entries: Vec<UsageEntry>) -> Self {
        Self {
            used_in: Patch::from_vec(entries),
            ..Self::default()
        }
    }

    pub fn references(ids: Vec<DocumentId>) -> Self {
        Self {
            references: Patch::from_vec(ids),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.used_in.is_keep() && self.references.is_keep()
    }
}

/// An externally-owned content item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    /// Type tag assigned by the content system (`page`, `post`, `reblock`).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub status: DocumentStatus,
    /// Parsed content tree.
    #[serde(default)]
    pub content: Vec<Node>,
    /// HTML output of the content, as produced by the content system.
    #[serde(default)]
    pub rendered: String,
    /// Public permalink, if the document has one.
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub meta: Metadata,
    #[serde(default)]
    pub revision: Revision,
}
impl Document {
    pub fn new(id: DocumentId, kind: impl Into<String>) -> Self {
        Self {
            id,
            kind: kind.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_status(mut self, status: DocumentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn published(self) -> Self {
        self.with_status(DocumentStatus::Published)
    }

    pub fn with_content(mut self, content: Vec<Node>) -> Self {
        self.content = content;
        self
    }

    /// Parses serialized block content into the document's content tree.
    pub fn with_serialized_content(self, serialized: &str) -> Self {
        self.with_content(parse(serialized))
    }

    pub fn with_rendered(mut self, rendered: impl Into<String>) -> Self {
        self.rendered = rendered.into();
        self
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_meta(mut self, meta: Metadata) -> Self {
        self.meta = meta;
        self
    }

    /// Drops everything but identity, status and metadata.
    pub fn into_fields(self, fields: Fields) -> Self {
        match fields {
            Fields::All => self,
            Fields::Meta => Self {
                content: Vec::new(),
                rendered: String::new(),
                ..self
            },
        }
    }
}

/// Which parts of a document a listing needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Fields {
    #[default]
    All,
    /// Identity, status, title and metadata only; no content or rendered HTML.
    Meta,
}

/// A title search over one document type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub kind: String,
    /// Case-insensitive substring matched against titles; empty matches all.
    pub query: String,
    pub exclude: BTreeSet<DocumentId>,
    /// 1-based page number.
    pub page: usize,
    pub per_page: usize,
}
impl SearchQuery {
    pub fn new(kind: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            query: query.into(),
            exclude: BTreeSet::new(),
            page: 1,
            per_page: 10,
        }
    }

    pub fn excluding(mut self, ids: impl IntoIterator<Item = DocumentId>) -> Self {
        self.exclude.extend(ids);
        self
    }

    pub fn page(mut self, page: usize, per_page: usize) -> Self {
        self.page = page.max(1);
        self.per_page = per_page;
        self
    }

    /// Returns `true` if `document` is a candidate result, ignoring paging.
    pub fn matches(&self, document: &Document) -> bool {
        document.kind == self.kind
            && document.status.is_published()
            && !self.exclude.contains(&document.id)
            && document.title.to_lowercase().contains(&self.query.to_lowercase())
    }
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocumentId,
    pub title: String,
}
impl From<&Document> for SearchHit {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            title: document.title.clone(),
        }
    }
}
