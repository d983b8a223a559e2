//! Content store interface for reblock.
//!
//! Documents are owned by an external content system; this crate only
//! describes how to reach them ([`ContentStore`]) and the metadata the
//! reference tracker attaches to them ([`Metadata`]).

pub mod backend;
pub mod error;
mod models;

pub use crate::backend::ContentStore;
pub use crate::models::{
    Document, DocumentId, DocumentStatus, Fields, MetaPatch, Metadata, Patch, Revision, SearchHit, SearchQuery,
    UsageEntry,
};
use std::sync::Arc;

pub type StoreHandle = Arc<dyn ContentStore + Send + Sync>;
