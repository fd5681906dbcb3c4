//! Transformers that decorate syntax-highlighted code blocks.
//!
//! The highlighter itself is external: it produces a hast-shaped [`Root`]
//! whose single child is the highlighted `pre` element. This crate rewrites
//! that tree, adding a header bar with the file name and a copy-to-clipboard
//! button, and serializes the result to HTML.
//!
//! - [`Root`], [`Node`], [`Element`]: the tree, (de)serializable as hast JSON
//! - [`RenderedCodeBlock`]: the code element plus the wrappers added around it
//! - [`CodeTransformer`], [`Header`], [`CopyButton`]: the individual rewrites
//! - [`CodeBlockPipeline`]: header then copy button, over one or many blocks
//!
//! Transformers are pure and synchronous; distinct blocks may be processed in
//! parallel.

mod block;
mod html;
mod node;
mod pipeline;
mod transform;

pub use block::{RenderedCodeBlock, TransformError};
pub use html::escape_html;
pub use node::{Element, Node, PropertyValue, Root, Text};
pub use pipeline::CodeBlockPipeline;
pub use transform::{CodeTransformer, CopyButton, Header, add_copy_button, add_header};
