use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute bag attached to a block.
pub type Attributes = BTreeMap<String, AttrValue>;

/// The closed set of attribute value kinds a block may carry.
///
/// Serialized blocks carry arbitrary JSON; anything that isn't one of these
/// kinds is dropped at the parsing boundary rather than coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Integer(i64),
    String(String),
    Boolean(bool),
}
impl AttrValue {
    /// Returns the value as a positive integer, if it is one.
    ///
    /// No coercion is performed: the string `"12"` is not an integer.
    pub fn as_positive_int(&self) -> Option<u64> {
        match self {
            Self::Integer(value) if *value > 0 => u64::try_from(*value).ok(),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Converts a JSON value into an attribute value, if it is of a
    /// supported kind.
    pub(crate) fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Boolean(b)),
            serde_json::Value::String(s) => Some(Self::String(s)),
            serde_json::Value::Number(n) => n.as_i64().map(Self::Integer),
            serde_json::Value::Null | serde_json::Value::Array(_) | serde_json::Value::Object(_) => None,
        }
    }
}
impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}
impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        Self::Integer(i64::from(value))
    }
}
impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}
impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}
impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// One parsed content element.
///
/// Named nodes are blocks; a node with an empty name is plain content whose
/// markup lives in [`html`](Self::html). Children are nested blocks, in
/// document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub children: Vec<Node>,
    /// The node's own markup, excluding any nested blocks.
    #[serde(default)]
    pub html: String,
}
impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// A nameless node holding a run of markup.
    pub fn freeform(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn is_freeform(&self) -> bool {
        self.name.is_empty()
    }

    pub fn attribute(&self, key: &str) -> Option<&AttrValue> {
        self.attributes.get(key)
    }
}
