use crate::adapt::adapt_embedded_content;
use crate::error::{ErrorKind, Result};
use crate::fragment::to_html;
use crate::{IFRAME_ATTRIBUTE, NESTED_ATTRIBUTE, Renderer};
use exn::ResultExt;
use html5ever::serialize::{Serialize, Serializer, TraversalScope};
use html5ever::{LocalName, QualName, local_name, ns};
use reblock_blocks::{AttrValue, Attributes};
use reblock_store::{Document, DocumentId};
use std::io;
use tracing::instrument;

/// Why a reference rendered as nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skipped {
    /// The reference carries no usable block id.
    MissingId,
    /// The referenced document does not exist.
    NotFound,
    /// The referenced document is not a reusable block.
    WrongType,
    /// The referenced block is not published.
    Unpublished,
    /// A framed block has no permalink to point at.
    NoLink,
}

/// What a reference block renders to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered {
    /// The block's own content.
    Inline { html: String, was_wrapped: bool },
    /// An iframe pointing at the block's permalink.
    Frame(String),
    Empty(Skipped),
}
impl Rendered {
    pub fn html(&self) -> &str {
        match self {
            Self::Inline { html, .. } | Self::Frame(html) => html,
            Self::Empty(_) => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        self.html().is_empty()
    }
}

impl Renderer {
    /// Renders a reference block from its attributes.
    ///
    /// Framing only needs the target to exist. Inlining also requires it to
    /// be a published block; its rendered HTML is adapted when the reference
    /// sits inside a layout wrapper.
    ///
    /// # Errors
    /// - [`ErrorKind::Store`] if the target could not be fetched for a reason
    ///   other than not existing.
    /// - [`ErrorKind::Markup`] if the iframe could not be written.
    #[instrument(skip_all, fields(store = self.store.name()))]
    pub async fn render(&self, attributes: &Attributes) -> Result<Rendered> {
        let Some(id) = attributes.get(&self.blocks.id_attribute).and_then(AttrValue::as_positive_int) else {
            tracing::trace!("Reference without a block id; rendering nothing");
            return Ok(Rendered::Empty(Skipped::MissingId));
        };
        let flag = |key: &str| attributes.get(key).and_then(AttrValue::as_bool).unwrap_or(false);

        let document = match self.store.get(id).await {
            Ok(document) => document,
            Err(e) if e.is_not_found() => {
                tracing::debug!(block = id, "Referenced block does not exist; rendering nothing");
                return Ok(Rendered::Empty(Skipped::NotFound));
            },
            Err(e) => return Err(e).or_raise(|| ErrorKind::Store),
        };

        if flag(IFRAME_ATTRIBUTE) {
            return frame(&document);
        }
        if document.kind != self.blocks.post_type {
            tracing::debug!(block = id, kind = %document.kind, "Referenced document is not a reusable block");
            return Ok(Rendered::Empty(Skipped::WrongType));
        }
        if !document.status.is_published() {
            tracing::debug!(block = id, "Referenced block is not published; rendering nothing");
            return Ok(Rendered::Empty(Skipped::Unpublished));
        }

        let adapted = adapt_embedded_content(&document.rendered, flag(NESTED_ATTRIBUTE), &self.wrapper);
        Ok(Rendered::Inline {
            html: adapted.html.into_owned(),
            was_wrapped: adapted.was_wrapped,
        })
    }
}

fn frame(document: &Document) -> Result<Rendered> {
    let Some(link) = document.link.as_deref() else {
        tracing::debug!(block = document.id, "Framed block has no permalink; rendering nothing");
        return Ok(Rendered::Empty(Skipped::NoLink));
    };
    let html = to_html(&Frame { id: document.id, link }).or_raise(|| ErrorKind::Markup)?;
    Ok(Rendered::Frame(html))
}

const FRAME_STYLE: &str = "width: 100%; height: auto; overflow: hidden; border: none;";

/// An iframe showing a block's permalink.
struct Frame<'a> {
    id: DocumentId,
    link: &'a str,
}

impl Serialize for Frame<'_> {
    fn serialize<S: Serializer>(&self, serializer: &mut S, _: TraversalScope) -> io::Result<()> {
        let attribute = |local: LocalName| QualName::new(None, ns!(), local);
        let id = self.id.to_string();
        let attrs = [
            (attribute(LocalName::from("data-reblock")), id.as_str()),
            (attribute(local_name!("style")), FRAME_STYLE),
            (attribute(local_name!("scrolling")), "no"),
            (attribute(local_name!("src")), self.link),
        ];
        let name = QualName::new(None, ns!(html), local_name!("iframe"));
        serializer.start_elem(name.clone(), attrs.iter().map(|(key, value)| (key, *value)))?;
        serializer.end_elem(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reblock_blocks::{BlockOptions, Node};
    use reblock_store::backend::MockStore;
    use reblock_store::{DocumentStatus, StoreHandle};
    use rstest::rstest;
    use std::sync::Arc;

    const WRAPPED: &str =
        r#"<div id="excelsior-bootstrap"><div class="page-container"><p>A</p><p>B</p></div></div>"#;

    fn store() -> Arc<MockStore> {
        Arc::new(MockStore::with_documents([
            Document::new(1, "reblock").published().with_rendered(WRAPPED).with_link("https://example.com/reblock/one/?a=1&b=2"),
            Document::new(2, "reblock").with_rendered("<p>Draft</p>").with_link("https://example.com/?p=2"),
            Document::new(3, "page").published().with_rendered("<p>Page</p>"),
            Document::new(4, "reblock").published().with_rendered("<p>No link</p>"),
            Document::new(5, "reblock").with_status(DocumentStatus::Other("private".to_string())),
        ]))
    }

    fn attributes(id: i64, nested: bool, iframe: bool) -> Attributes {
        Node::new("reblock/reblock-block-selector")
            .with_attribute("blockId", id)
            .with_attribute(NESTED_ATTRIBUTE, nested)
            .with_attribute(IFRAME_ATTRIBUTE, iframe)
            .attributes
    }

    async fn render(attributes: &Attributes) -> Rendered {
        Renderer::new(store()).render(attributes).await.unwrap()
    }

    #[tokio::test]
    async fn test_inline_nested_is_adapted() {
        let rendered = render(&attributes(1, true, false)).await;
        assert_eq!(
            rendered,
            Rendered::Inline {
                html: "<p>A</p><p>B</p>".to_string(),
                was_wrapped: true
            }
        );
    }

    #[tokio::test]
    async fn test_inline_top_level_is_verbatim() {
        let rendered = render(&attributes(1, false, false)).await;
        assert_eq!(rendered.html(), WRAPPED);
    }

    #[tokio::test]
    async fn test_iframe() {
        let rendered = render(&attributes(1, false, true)).await;
        assert_eq!(
            rendered,
            Rendered::Frame(
                r#"<iframe data-reblock="1" style="width: 100%; height: auto; overflow: hidden; border: none;" scrolling="no" src="https://example.com/reblock/one/?a=1&amp;b=2"></iframe>"#
                    .to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_iframe_ignores_status() {
        assert!(matches!(render(&attributes(2, false, true)).await, Rendered::Frame(_)));
    }

    #[rstest]
    #[case::zero(0, Skipped::MissingId)]
    #[case::negative(-4, Skipped::MissingId)]
    #[case::missing(99, Skipped::NotFound)]
    #[case::draft(2, Skipped::Unpublished)]
    #[case::private(5, Skipped::Unpublished)]
    #[case::wrong_type(3, Skipped::WrongType)]
    #[tokio::test]
    async fn test_skipped(#[case] id: i64, #[case] reason: Skipped) {
        let rendered = render(&attributes(id, false, false)).await;
        assert_eq!(rendered, Rendered::Empty(reason));
        assert!(rendered.is_empty());
    }

    #[tokio::test]
    async fn test_iframe_without_link() {
        assert_eq!(render(&attributes(4, false, true)).await, Rendered::Empty(Skipped::NoLink));
    }

    #[tokio::test]
    async fn test_missing_attributes() {
        assert_eq!(render(&Attributes::new()).await, Rendered::Empty(Skipped::MissingId));
        let string_id = Node::new("x").with_attribute("blockId", "1").attributes;
        assert_eq!(render(&string_id).await, Rendered::Empty(Skipped::MissingId));
    }

    #[tokio::test]
    async fn test_store_failure_is_an_error() {
        let store = store();
        store.fail_on(1).await;
        let handle: StoreHandle = store;
        let err = Renderer::new(handle).render(&attributes(1, false, false)).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Store));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_custom_block_options() {
        let renderer = Renderer::new(store()).with_blocks(BlockOptions {
            marker: "acme/page-embed".to_string(),
            id_attribute: "ref".to_string(),
            post_type: "page".to_string(),
        });
        let attributes = Node::new("acme/page-embed").with_attribute("ref", 3).attributes;
        assert_eq!(renderer.render(&attributes).await.unwrap().html(), "<p>Page</p>");
    }
}
