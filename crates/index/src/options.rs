use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Reverse index write behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Check-and-set attempts per metadata write before a target is treated
    /// as a transient failure.
    pub max_write_attempts: u32,
    /// Compute every change but drop the writes.
    pub dry_run: bool,
}
impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_write_attempts: 3,
            dry_run: false,
        }
    }
}

/// Which edges the exclusion walk follows from each visited document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Traversal {
    /// Forward references: everything the candidate (transitively) embeds.
    #[default]
    Outgoing,
    /// Reverse index: everything that (transitively) embeds the candidate.
    Incoming,
    /// Both directions.
    Both,
}
impl Traversal {
    pub(crate) fn outgoing(self) -> bool {
        matches!(self, Self::Outgoing | Self::Both)
    }

    pub(crate) fn incoming(self) -> bool {
        matches!(self, Self::Incoming | Self::Both)
    }
}

/// What the exclusion walk returns when its budget runs out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overrun {
    /// Only the candidate itself.
    ExcludeNothing,
    /// The candidate and its direct references.
    #[default]
    DirectOnly,
    /// Everything visited before the budget ran out.
    Partial,
}

/// Budget and shape of the exclusion walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExclusionOptions {
    pub traversal: Traversal,
    /// Maximum number of documents visited, the candidate included.
    pub max_nodes: usize,
    /// Wall-clock budget for the whole walk, in milliseconds.
    pub timeout_ms: u64,
    pub on_overrun: Overrun,
}
impl ExclusionOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
impl Default for ExclusionOptions {
    fn default() -> Self {
        Self {
            traversal: Traversal::default(),
            max_nodes: 1000,
            timeout_ms: 2000,
            on_overrun: Overrun::default(),
        }
    }
}

/// Selection search paging and cycle guard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchOptions {
    pub per_page: usize,
    /// Edges followed when excluding results. Following incoming edges keeps
    /// out blocks that already embed the candidate.
    pub traversal: Traversal,
}
impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            per_page: 10,
            traversal: Traversal::Both,
        }
    }
}
