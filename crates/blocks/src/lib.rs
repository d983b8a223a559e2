//! Content tree model for reusable blocks.
//!
//! A document's content is an ordered sequence of [`Node`]s. Each node is
//! either a named block (carrying typed [`Attributes`] and nested children)
//! or a freeform run of markup with an empty name. This crate provides:
//!
//! - the tree model itself,
//! - [`parse`] for the serialized block-comment grammar, and
//! - [`extract_reference_ids`], the structural fold that finds every
//!   reusable block a tree embeds.

mod consts;
mod extract;
mod node;
mod parse;

pub use crate::extract::{BlockOptions, extract_reference_ids};
pub use crate::node::{AttrValue, Attributes, Node};
pub use crate::parse::parse;
