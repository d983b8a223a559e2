//! Reference tracking between documents and the reusable blocks they embed.
//!
//! The [`Tracker`] reacts to content system events:
//!
//! - a canonical save diffs the document's references against the previous
//!   save and updates each affected block's reverse index ([`update_index`]);
//! - a deletion purges the document from every block's reverse index
//!   ([`purge_usage`]);
//! - choosing a new embed target consults the [`ExclusionSet`] so that no
//!   reference cycle can be created.
//!
//! All persistent state lives in document metadata behind a
//! [`ContentStore`](reblock_store::ContentStore); every write is a
//! check-and-set against the document's revision.

mod cascade;
pub mod error;
mod exclusion;
mod maintainer;
mod options;
mod tracker;
mod usage;

pub use crate::cascade::{CascadeReport, purge_usage};
pub use crate::exclusion::{Budget, ExclusionSet, exclusion_set};
pub use crate::maintainer::{IndexUpdate, update_index};
pub use crate::options::{ExclusionOptions, IndexOptions, Overrun, SearchOptions, Traversal};
pub use crate::tracker::{SaveKind, Tracker};
