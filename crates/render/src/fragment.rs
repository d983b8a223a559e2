//! Fragment serialization.
//!
//! Parsed fragments are written back out through html5ever's serializer,
//! which owns escaping, void elements, raw text and namespaced attributes.
//! [`Fragment`] only decides which nodes get visited: comments never are, and
//! one element may be swapped for the children of another without touching
//! the parsed tree.

use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::{QualName, local_name, ns};
use scraper::{ElementRef, Node};
use std::io;

/// Writes `node` as HTML, leaving out the node itself.
pub(crate) fn to_html<T: Serialize>(node: &T) -> io::Result<String> {
    let mut out = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: TraversalScope::ChildrenOnly(None),
        ..SerializeOpts::default()
    };
    serialize(&mut out, node, opts)?;
    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}

/// An element to replace during serialization.
#[derive(Clone, Copy)]
pub(crate) struct Substitute<'a> {
    /// The element that is not written.
    pub(crate) target: ElementRef<'a>,
    /// Whose children are written in its place, if anything.
    pub(crate) with: Option<ElementRef<'a>>,
}

/// The contents of a parsed element, without comments.
pub(crate) struct Fragment<'a> {
    root: ElementRef<'a>,
    substitute: Option<Substitute<'a>>,
}
impl<'a> Fragment<'a> {
    pub(crate) fn new(root: ElementRef<'a>) -> Self {
        Self { root, substitute: None }
    }

    pub(crate) fn substituting(mut self, substitute: Substitute<'a>) -> Self {
        self.substitute = Some(substitute);
        self
    }

    fn children<S: Serializer>(&self, serializer: &mut S, parent: ElementRef<'a>) -> io::Result<()> {
        for child in parent.children() {
            match child.value() {
                Node::Text(text) => serializer.write_text(text)?,
                Node::Element(_) => {
                    if let Some(element) = ElementRef::wrap(child) {
                        self.element(serializer, element)?;
                    }
                },
                _ => {},
            }
        }
        Ok(())
    }

    fn element<S: Serializer>(&self, serializer: &mut S, element: ElementRef<'a>) -> io::Result<()> {
        if let Some(substitute) = self.substitute
            && element.id() == substitute.target.id()
        {
            return match substitute.with {
                Some(with) => self.children(serializer, with),
                None => Ok(()),
            };
        }
        let name = element.value().name.clone();
        let attrs = element.value().attrs.iter().map(|(key, value)| (key, &value[..]));
        serializer.start_elem(name.clone(), attrs)?;
        // The parser eats one leading newline in these elements, so a text
        // that still starts with one needs it written twice.
        if eats_leading_newline(&name) && starts_with_newline(element) {
            serializer.write_text("\n")?;
        }
        self.children(serializer, element)?;
        serializer.end_elem(name)
    }
}

impl Serialize for Fragment<'_> {
    fn serialize<S: Serializer>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()> {
        match traversal_scope {
            TraversalScope::IncludeNode => self.element(serializer, self.root),
            TraversalScope::ChildrenOnly(_) => self.children(serializer, self.root),
        }
    }
}

fn eats_leading_newline(name: &QualName) -> bool {
    name.ns == ns!(html) && matches!(name.local, local_name!("pre") | local_name!("textarea") | local_name!("listing"))
}

fn starts_with_newline(element: ElementRef<'_>) -> bool {
    element
        .first_child()
        .and_then(|child| child.value().as_text().map(|text| text.starts_with('\n')))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use scraper::Html;

    fn roundtrip(input: &str) -> String {
        let fragment = Html::parse_fragment(input);
        to_html(&Fragment::new(fragment.root_element())).unwrap()
    }

    #[rstest]
    #[case::plain("<p>Hello</p>", "<p>Hello</p>")]
    #[case::nested("<div><p>A <em>b</em></p></div>", "<div><p>A <em>b</em></p></div>")]
    #[case::text_only("just text", "just text")]
    #[case::entities("<p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p>", "<p>1 &lt; 2 &amp;&amp; 3 &gt; 2</p>")]
    #[case::nbsp("<p>a&nbsp;b</p>", "<p>a&nbsp;b</p>")]
    #[case::void("<p>a<br>b<img src=\"x.png\"></p>", "<p>a<br>b<img src=\"x.png\"></p>")]
    #[case::attribute_quotes("<a title='say \"hi\"'>x</a>", "<a title=\"say &quot;hi&quot;\">x</a>")]
    #[case::comments("<p>a<!-- note -->b</p><!-- tail -->", "<p>ab</p>")]
    #[case::raw_text("<script>if (a < b && c) {}</script>", "<script>if (a < b && c) {}</script>")]
    #[case::xlink(
        "<svg><use xlink:href=\"#icon\"></use></svg>",
        "<svg><use xlink:href=\"#icon\"></use></svg>"
    )]
    #[case::pre_newline("<pre>\n\ncode</pre>", "<pre>\n\ncode</pre>")]
    #[case::pre_single_newline("<pre>\ncode</pre>", "<pre>code</pre>")]
    #[case::textarea_newline("<textarea>\n\nnote</textarea>", "<textarea>\n\nnote</textarea>")]
    fn test_fragment(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(roundtrip(input), expected);
    }

    #[test]
    fn test_pre_text_survives_reparse() {
        let written = roundtrip("<pre>\n\ncode</pre>");
        let reparsed = Html::parse_fragment(&written);
        let pre = reparsed.select(&scraper::Selector::parse("pre").unwrap()).next().unwrap();
        assert_eq!(pre.text().collect::<String>(), "\ncode");
    }

    #[test]
    fn test_substitute_without_replacement() {
        let fragment = Html::parse_fragment("<p>a</p><div>gone</div><p>b</p>");
        let root = fragment.root_element();
        let target = root.children().filter_map(ElementRef::wrap).nth(1).unwrap();
        let html = to_html(&Fragment::new(root).substituting(Substitute { target, with: None })).unwrap();
        assert_eq!(html, "<p>a</p><p>b</p>");
    }
}
