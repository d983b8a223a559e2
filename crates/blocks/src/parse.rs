//! Parser for the serialized block grammar.
//!
//! Blocks are delimited by HTML comments:
//!
//! ```text
//! <!-- wp:core/group {"layout":"flex"} -->
//!   <div class="group"><!-- wp:reblock/reblock-block-selector {"blockId":12} /--></div>
//! <!-- /wp:core/group -->
//! ```
//!
//! The parser never fails. Broken attribute JSON yields an empty attribute
//! map, unclosed blocks are closed at the end of the input and stray closing
//! delimiters are kept as plain markup.

use tracing::instrument;

use crate::consts::{BLOCK_DELIMITER, DEFAULT_NAMESPACE};
use crate::node::{AttrValue, Attributes, Node};

/// Parses serialized post content into a content tree.
///
/// # Examples
///
/// ```
/// use reblock_blocks::{AttrValue, parse};
///
/// let tree = parse(r#"<!-- wp:reblock/reblock-block-selector {"blockId":12} /-->"#);
/// assert_eq!(tree.len(), 1);
/// assert_eq!(tree[0].name, "reblock/reblock-block-selector");
/// assert_eq!(tree[0].attribute("blockId"), Some(&AttrValue::Integer(12)));
/// ```
#[instrument(level = "trace", skip(content), fields(content_size = content.len()))]
pub fn parse(content: &str) -> Vec<Node> {
    let mut output = Vec::new();
    let mut stack: Vec<Node> = Vec::new();
    let mut cursor = 0;

    for captures in BLOCK_DELIMITER.captures_iter(content) {
        let Some(delimiter) = captures.get(0) else {
            continue;
        };
        push_markup(&mut stack, &mut output, &content[cursor..delimiter.start()]);
        cursor = delimiter.end();

        let namespace = captures
            .name("namespace")
            .map(|m| m.as_str().trim_end_matches('/'))
            .unwrap_or(DEFAULT_NAMESPACE);
        let name = format!("{}/{}", namespace, &captures["name"]);

        if captures.name("closer").is_some() {
            match stack.pop() {
                Some(node) => {
                    if node.name != name {
                        tracing::trace!(open = %node.name, close = %name, "Mismatched block closer");
                    }
                    attach(&mut stack, &mut output, node);
                },
                None => push_markup(&mut stack, &mut output, delimiter.as_str()),
            }
            continue;
        }

        let node = Node {
            name,
            attributes: captures.name("attrs").map(|m| attributes(m.as_str())).unwrap_or_default(),
            ..Node::default()
        };
        match captures.name("void") {
            Some(_) => attach(&mut stack, &mut output, node),
            None => stack.push(node),
        }
    }

    push_markup(&mut stack, &mut output, &content[cursor..]);
    while let Some(node) = stack.pop() {
        tracing::trace!(name = %node.name, "Closing unterminated block at end of content");
        attach(&mut stack, &mut output, node);
    }
    output
}

fn attributes(raw: &str) -> Attributes {
    match serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(raw) {
        Ok(map) => map.into_iter().filter_map(|(k, v)| AttrValue::from_json(v).map(|v| (k, v))).collect(),
        Err(e) => {
            tracing::trace!(error = %e, "Ignoring malformed block attributes");
            Attributes::new()
        },
    }
}

fn attach(stack: &mut [Node], output: &mut Vec<Node>, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None => output.push(node),
    }
}

fn push_markup(stack: &mut [Node], output: &mut Vec<Node>, markup: &str) {
    if markup.is_empty() {
        return;
    }
    match stack.last_mut() {
        Some(parent) => parent.html.push_str(markup),
        None => match output.last_mut() {
            Some(last) if last.is_freeform() => last.html.push_str(markup),
            _ => output.push(Node::freeform(markup)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{BlockOptions, extract_reference_ids};

    #[test]
    fn test_void_block() {
        let tree = parse(r#"<!-- wp:reblock/reblock-block-selector {"blockId":12,"useIframe":true} /-->"#);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "reblock/reblock-block-selector");
        assert_eq!(tree[0].attribute("blockId"), Some(&AttrValue::Integer(12)));
        assert_eq!(tree[0].attribute("useIframe"), Some(&AttrValue::Boolean(true)));
        assert!(tree[0].children.is_empty());
    }

    #[test]
    fn test_default_namespace() {
        let tree = parse("<!-- wp:paragraph --><p>Hello</p><!-- /wp:paragraph -->");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "core/paragraph");
        assert_eq!(tree[0].html, "<p>Hello</p>");
    }

    #[test]
    fn test_nested_blocks() {
        let content = concat!(
            "<!-- wp:group -->\n",
            "<div class=\"wp-block-group\">",
            "<!-- wp:reblock/reblock-block-selector {\"blockId\":3} /-->",
            "<!-- wp:columns --><!-- wp:column -->",
            "<!-- wp:reblock/reblock-block-selector {\"blockId\":5} /-->",
            "<!-- /wp:column --><!-- /wp:columns -->",
            "</div>\n",
            "<!-- /wp:group -->",
        );
        let tree = parse(content);
        assert_eq!(tree.len(), 1);
        let group = &tree[0];
        assert_eq!(group.name, "core/group");
        assert_eq!(group.children.len(), 2);
        assert_eq!(group.children[1].name, "core/columns");
        assert_eq!(group.children[1].children[0].name, "core/column");
        assert_eq!(group.html, "\n<div class=\"wp-block-group\"></div>\n");
        assert_eq!(extract_reference_ids(&tree, &BlockOptions::default()), vec![3, 5]);
    }

    #[test]
    fn test_freeform_between_blocks() {
        let tree = parse("<p>before</p><!-- wp:separator /--><p>after</p>");
        assert_eq!(tree.len(), 3);
        assert_eq!(tree[0], Node::freeform("<p>before</p>"));
        assert_eq!(tree[1].name, "core/separator");
        assert_eq!(tree[2], Node::freeform("<p>after</p>"));
    }

    #[test]
    fn test_plain_html_only() {
        assert_eq!(parse("<p>no blocks</p>"), vec![Node::freeform("<p>no blocks</p>")]);
        assert!(parse("").is_empty());
    }

    #[test]
    fn test_malformed_attributes() {
        let tree = parse("<!-- wp:reblock/reblock-block-selector {\"blockId\":} /-->");
        assert_eq!(tree.len(), 1);
        assert!(tree[0].attributes.is_empty());
    }

    #[test]
    fn test_unsupported_attribute_kinds_dropped() {
        let tree = parse(r#"<!-- wp:image {"id":4,"ratio":1.5,"style":{"border":"0"},"alt":"x"} /-->"#);
        let keys: Vec<_> = tree[0].attributes.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["alt", "id"]);
    }

    #[test]
    fn test_unclosed_block() {
        let tree = parse("<!-- wp:group --><!-- wp:reblock/reblock-block-selector {\"blockId\":8} /-->");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].name, "core/group");
        assert_eq!(tree[0].children.len(), 1);
    }

    #[test]
    fn test_stray_closer_kept_as_markup() {
        let tree = parse("<p>a</p><!-- /wp:group --><p>b</p>");
        assert_eq!(tree, vec![Node::freeform("<p>a</p><!-- /wp:group --><p>b</p>")]);
    }

    #[test]
    fn test_ordinary_comments_are_markup() {
        let tree = parse("<!-- just a comment --><!-- wp:spacer /-->");
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0], Node::freeform("<!-- just a comment -->"));
        assert_eq!(tree[1].name, "core/spacer");
    }
}
