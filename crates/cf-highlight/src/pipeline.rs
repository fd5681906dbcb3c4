//! Fixed-order transformer pipeline for rendered code blocks.

use rayon::prelude::*;

use crate::block::{RenderedCodeBlock, TransformError};
use crate::node::Root;
use crate::transform::{CodeTransformer, CopyButton, Header};

/// Decorates rendered code blocks with an optional header and copy button.
///
/// Stages always run header first, then copy button, whatever order the
/// builder methods are called in. The block stays typed between stages, so
/// the copy button is appended to the code element inside the header card.
///
/// # Example
///
/// ```
/// use cf_highlight::{CodeBlockPipeline, Element, Node, Root};
///
/// let pipeline = CodeBlockPipeline::new()
///     .with_copy_button()
///     .with_header("frontdoor.py", true);
///
/// let root = Root::new(vec![Element::new("pre").with_child(Node::text("x = 1")).into()]);
/// let html = pipeline.run(root).unwrap().to_html();
///
/// assert!(html.starts_with(r#"<div class="relative"><div class="not-prose"#));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CodeBlockPipeline {
    header: Option<Header>,
    copy_button: Option<CopyButton>,
}

impl CodeBlockPipeline {
    /// Pipeline with no stages.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header bar showing `title`.
    #[must_use]
    pub fn with_header(mut self, title: impl Into<String>, truncate: bool) -> Self {
        self.header = Some(Header::new(title, truncate));
        self
    }

    /// Add a copy button.
    #[must_use]
    pub fn with_copy_button(mut self) -> Self {
        self.copy_button = Some(CopyButton);
        self
    }

    /// Enabled stages in execution order.
    pub fn stages(&self) -> impl Iterator<Item = &dyn CodeTransformer> {
        let header = self.header.as_ref().map(|h| h as &dyn CodeTransformer);
        let copy_button = self.copy_button.as_ref().map(|c| c as &dyn CodeTransformer);
        header.into_iter().chain(copy_button)
    }

    /// Run every stage on one rendered code block.
    ///
    /// An empty root, or a pipeline with no stages, returns the root unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if the root is not a single element; the
    /// error names the first stage.
    pub fn run(&self, root: Root) -> Result<Root, TransformError> {
        let Some(first) = self.stages().next() else {
            return Ok(root);
        };
        let Some(block) = RenderedCodeBlock::from_root(root, first.name())? else {
            return Ok(Root::default());
        };

        let block = self.stages().fold(block, |block, stage| stage.transform(block));
        tracing::trace!(depth = block.depth(), "Code block decorated");
        Ok(block.into_root())
    }

    /// Run the pipeline over independent blocks in parallel.
    ///
    /// Results keep the input order.
    pub fn run_many(&self, roots: Vec<Root>) -> Vec<Result<Root, TransformError>> {
        roots.into_par_iter().map(|root| self.run(root)).collect()
    }
}
