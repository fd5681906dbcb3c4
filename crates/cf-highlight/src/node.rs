//! Syntax tree of a rendered code block.
//!
//! The shape follows hast: a [`Root`] holds [`Node`]s, each either an
//! [`Element`] or a text node. Trees (de)serialize as hast JSON, so output of
//! an external highlighter can be read directly:
//!
//! ```json
//! {"type": "root", "children": [
//!   {"type": "element", "tagName": "pre", "properties": {"class": "shiki"},
//!    "children": [{"type": "text", "value": "x = 1"}]}
//! ]}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level node of a rendered code block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "root")]
pub struct Root {
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Root {
    #[must_use]
    pub fn new(children: Vec<Node>) -> Self {
        Self { children }
    }
}

/// A child node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text(Text),
}

impl Node {
    /// Text node.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(Text {
            value: value.into(),
        })
    }

    #[must_use]
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// Text node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Text {
    pub value: String,
}

/// Element node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub tag_name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, PropertyValue>,
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Element {
    /// Element with no properties or children.
    #[must_use]
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }

    /// Set a property.
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Append a child.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Class list, from either a `class` string or a `className` list.
    #[must_use]
    pub fn classes(&self) -> Vec<&str> {
        let mut classes = Vec::new();
        for key in ["class", "className"] {
            match self.properties.get(key) {
                Some(PropertyValue::Text(value)) => classes.extend(value.split_whitespace()),
                Some(PropertyValue::List(values)) => classes.extend(values.iter().map(String::as_str)),
                _ => {}
            }
        }
        classes
    }

    /// Number of descendant elements (including `self`) with the given tag.
    #[must_use]
    pub fn count_tag(&self, tag_name: &str) -> usize {
        usize::from(self.tag_name == tag_name)
            + self
                .children
                .iter()
                .filter_map(Node::as_element)
                .map(|child| child.count_tag(tag_name))
                .sum::<usize>()
    }
}

/// Value of an element property.
///
/// hast stores `className` as a list and most other properties as strings;
/// booleans and numbers appear for attributes such as `hidden` or `tabIndex`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Bool(bool),
    Number(serde_json::Number),
    List(Vec<String>),
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}
