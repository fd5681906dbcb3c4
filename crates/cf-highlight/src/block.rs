//! Typed view of a rendered code block.

use crate::node::{Element, Node, Root};

/// Error returned when a tree is not a single rendered code block.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransformError {
    /// The root has more than one top-level child.
    #[error("{transformer}: expected one rendered code block, found {count} top-level nodes")]
    MultipleChildren {
        /// Transformer that rejected the tree.
        transformer: &'static str,
        /// Number of top-level children.
        count: usize,
    },
    /// The single top-level child is not an element.
    #[error("{transformer}: top-level node is not an element")]
    NotAnElement {
        /// Transformer that rejected the tree.
        transformer: &'static str,
    },
}

/// A wrapper element placed around the block, with siblings preceding it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Layer {
    wrapper: Element,
    before: Vec<Node>,
}

/// A rendered code block and the decorations added around it.
///
/// The highlighted code element stays addressable however many wrappers
/// are added, so stages that insert into the code (the copy button) do not
/// depend on which stages ran before them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCodeBlock {
    code: Element,
    layers: Vec<Layer>,
}

impl RenderedCodeBlock {
    /// Block for a highlighted code element with no decorations.
    #[must_use]
    pub fn new(code: Element) -> Self {
        Self {
            code,
            layers: Vec::new(),
        }
    }

    /// Take the single top-level element of `root` as the code element.
    ///
    /// Returns `Ok(None)` for an empty root. `transformer` names the caller in
    /// errors.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError::MultipleChildren`] for more than one
    /// top-level node and [`TransformError::NotAnElement`] for a single text
    /// node.
    pub fn from_root(root: Root, transformer: &'static str) -> Result<Option<Self>, TransformError> {
        let count = root.children.len();
        let mut children = root.children.into_iter();
        match (children.next(), count) {
            (None, _) => Ok(None),
            (Some(Node::Element(code)), 1) => Ok(Some(Self::new(code))),
            (Some(Node::Text(_)), 1) => Err(TransformError::NotAnElement { transformer }),
            (Some(_), count) => Err(TransformError::MultipleChildren { transformer, count }),
        }
    }

    /// The code element.
    #[must_use]
    pub fn code(&self) -> &Element {
        &self.code
    }

    /// Append a node as the last child of the code element.
    pub fn append_to_code(&mut self, node: impl Into<Node>) {
        self.code.children.push(node.into());
    }

    /// Wrap the current block in `wrapper`, with `before` as preceding siblings.
    ///
    /// Any children already in `wrapper` are kept ahead of `before`.
    pub fn wrap(&mut self, wrapper: Element, before: Vec<Node>) {
        self.layers.push(Layer { wrapper, before });
    }

    /// Number of wrappers around the code element.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Outermost element, with every layer applied.
    #[must_use]
    pub fn into_element(self) -> Element {
        self.layers.into_iter().fold(self.code, |inner, layer| {
            let mut wrapper = layer.wrapper;
            wrapper.children.extend(layer.before);
            wrapper.children.push(inner.into());
            wrapper
        })
    }

    /// Root whose sole child is the outermost element.
    #[must_use]
    pub fn into_root(self) -> Root {
        Root::new(vec![self.into_element().into()])
    }
}
