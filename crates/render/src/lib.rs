//! Server-side rendering of embedded reusable blocks.
//!
//! [`Renderer::render`] turns a reference block's attributes into the HTML
//! that stands in for it on the page: the block's own rendered content, an
//! iframe pointing at its permalink, or nothing at all. Content embedded
//! inside a layout wrapper goes through [`adapt_embedded_content`] first.

mod adapt;
pub mod error;
mod fragment;
mod render;

pub use crate::adapt::{Adapted, WrapperSpec, adapt_embedded_content};
pub use crate::render::{Rendered, Skipped};
use reblock_blocks::BlockOptions;
use reblock_store::StoreHandle;

/// Attribute flagging a reference placed inside a layout wrapper.
pub const NESTED_ATTRIBUTE: &str = "hasExcelsiorBootstrap";
/// Attribute asking for the block to be framed rather than inlined.
pub const IFRAME_ATTRIBUTE: &str = "useIframe";

pub struct Renderer {
    store: StoreHandle,
    blocks: BlockOptions,
    wrapper: WrapperSpec,
}
impl Renderer {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            blocks: BlockOptions::default(),
            wrapper: WrapperSpec::default(),
        }
    }

    pub fn with_blocks(mut self, blocks: BlockOptions) -> Self {
        self.blocks = blocks;
        self
    }

    pub fn with_wrapper(mut self, wrapper: WrapperSpec) -> Self {
        self.wrapper = wrapper;
        self
    }
}
