use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::instrument;

use crate::node::Node;

/// Identifies reusable blocks and the references to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlockOptions {
    /// Name of the block that embeds a reusable block by reference.
    pub marker: String,
    /// Attribute on the marker block holding the referenced document ID.
    pub id_attribute: String,
    /// Document type of reusable blocks (the only valid reference targets).
    pub post_type: String,
}
impl Default for BlockOptions {
    fn default() -> Self {
        Self {
            marker: "reblock/reblock-block-selector".to_string(),
            id_attribute: "blockId".to_string(),
            post_type: "reblock".to_string(),
        }
    }
}
impl BlockOptions {
    /// Returns the referenced ID if `node` is a well-formed reference.
    pub fn reference_id(&self, node: &Node) -> Option<u64> {
        if node.name != self.marker {
            return None;
        }
        let id = node.attribute(&self.id_attribute).and_then(|value| value.as_positive_int());
        if id.is_none() {
            tracing::trace!(attributes = ?node.attributes, "Skipping reference block without a valid ID");
        }
        id
    }
}

/// Extracts the IDs of every reusable block referenced anywhere in `tree`.
///
/// Output is in document order with duplicates removed (the first embed of a
/// target wins); several embeds of the same block collapse to one edge.
/// Malformed reference nodes are skipped silently, and every node's children
/// are walked whether or not the node itself matched.
///
/// # Examples
///
/// ```
/// use reblock_blocks::{BlockOptions, Node, extract_reference_ids};
///
/// let options = BlockOptions::default();
/// let tree = vec![
///     Node::new("core/group").with_child(
///         Node::new("reblock/reblock-block-selector").with_attribute("blockId", 7),
///     ),
///     Node::new("reblock/reblock-block-selector").with_attribute("blockId", 3),
/// ];
/// assert_eq!(extract_reference_ids(&tree, &options), vec![7, 3]);
/// ```
#[instrument(level = "trace", skip_all, fields(nodes = tree.len()))]
pub fn extract_reference_ids(tree: &[Node], options: &BlockOptions) -> Vec<u64> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    collect(tree, options, &mut seen, &mut ids);
    ids
}

fn collect(nodes: &[Node], options: &BlockOptions, seen: &mut HashSet<u64>, ids: &mut Vec<u64>) {
    for node in nodes {
        if let Some(id) = options.reference_id(node)
            && seen.insert(id)
        {
            ids.push(id);
        }
        collect(&node.children, options, seen, ids);
    }
}
