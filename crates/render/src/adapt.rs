//! Wrapper-fragment adaptation.
//!
//! A block authored inside a layout wrapper carries that wrapper in its
//! rendered HTML. When the block is embedded into a page that already has the
//! same wrapper, the inner one is redundant: its designated content container
//! is lifted into the wrapper's place and the rest of the wrapper is dropped.

use crate::fragment::{Fragment, Substitute, to_html};
use scraper::{ElementRef, Html};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Identifies the layout wrapper and its content container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WrapperSpec {
    /// `id` of the wrapping `div`.
    pub wrapper_id: String,
    /// Class of the `div` inside the wrapper whose children are kept.
    pub container_class: String,
}
impl Default for WrapperSpec {
    fn default() -> Self {
        Self {
            wrapper_id: "excelsior-bootstrap".to_string(),
            container_class: "page-container".to_string(),
        }
    }
}

/// Adapted HTML and whether a wrapper was stripped from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adapted<'a> {
    pub html: Cow<'a, str>,
    pub was_wrapped: bool,
}
impl<'a> Adapted<'a> {
    fn unchanged(html: &'a str) -> Self {
        Self {
            html: Cow::Borrowed(html),
            was_wrapped: false,
        }
    }

    pub fn into_owned(self) -> Adapted<'static> {
        Adapted {
            html: Cow::Owned(self.html.into_owned()),
            was_wrapped: self.was_wrapped,
        }
    }
}

/// Strips the layout wrapper from `html` when it is `nested` inside another
/// one.
///
/// The first `div` whose id is [`WrapperSpec::wrapper_id`] is replaced by the
/// children of the first `div` inside it carrying
/// [`WrapperSpec::container_class`], or by nothing if there is no such
/// container. When that happens every comment in the fragment is dropped as
/// well. Otherwise, or when not `nested`, the input is returned untouched.
///
/// # Examples
///
/// ```
/// use reblock_render::{WrapperSpec, adapt_embedded_content};
///
/// let html = r#"<div id="excelsior-bootstrap"><div class="page-container"><p>A</p><p>B</p></div></div>"#;
/// let adapted = adapt_embedded_content(html, true, &WrapperSpec::default());
/// assert_eq!(adapted.html, "<p>A</p><p>B</p>");
/// assert!(adapted.was_wrapped);
/// ```
pub fn adapt_embedded_content<'a>(html: &'a str, nested: bool, spec: &WrapperSpec) -> Adapted<'a> {
    if !nested || html.is_empty() {
        return Adapted::unchanged(html);
    }
    let parsed = Html::parse_fragment(html);
    let root = parsed.root_element();
    let Some(wrapper) = first_div(root, |div| div.value().id() == Some(spec.wrapper_id.as_str())) else {
        tracing::trace!(wrapper = %spec.wrapper_id, "No layout wrapper in embedded content");
        return Adapted::unchanged(html);
    };
    let container = wrapper
        .descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| is_div(*el) && el.value().classes().any(|class| class == spec.container_class));
    if container.is_none() {
        tracing::debug!(wrapper = %spec.wrapper_id, "Layout wrapper has no content container; dropping it whole");
    }

    let fragment = Fragment::new(root).substituting(Substitute {
        target: wrapper,
        with: container,
    });
    match to_html(&fragment) {
        Ok(out) => Adapted {
            html: Cow::Owned(out),
            was_wrapped: true,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Could not serialize adapted content; keeping it as is");
            Adapted::unchanged(html)
        },
    }
}

fn is_div(element: ElementRef<'_>) -> bool {
    element.value().name() == "div"
}

fn first_div<'a>(root: ElementRef<'a>, predicate: impl Fn(ElementRef<'a>) -> bool) -> Option<ElementRef<'a>> {
    root.descendants().filter_map(ElementRef::wrap).find(|el| is_div(*el) && predicate(*el))
}
