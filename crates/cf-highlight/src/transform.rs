//! Code-block transformers: the header bar and the copy button.
//!
//! Each transformer works on a [`RenderedCodeBlock`]. Applied to a bare
//! [`Root`] through [`CodeTransformer::apply`], the root's single element is
//! taken as the code element, so composing at root level is order-sensitive:
//! a copy button added after a header lands in the header's card, not in the
//! code. [`crate::CodeBlockPipeline`] keeps the block typed between stages to
//! avoid that.

use crate::block::{RenderedCodeBlock, TransformError};
use crate::node::{Element, Node, Root};

/// Clipboard icon path drawn inside the copy button.
const CLIPBOARD_PATH: &str = "M8.25 7.5V6.108c0-1.135.845-2.098 1.976-2.192.373-.03.748-.057 1.123-.08M15.75 18H18a2.25 2.25 0 0 0 2.25-2.25V6.108c0-1.135-.845-2.098-1.976-2.192a48.424 48.424 0 0 0-1.123-.08M15.75 18.75v-1.875a3.375 3.375 0 0 0-3.375-3.375h-1.5a1.125 1.125 0 0 1-1.125-1.125v-1.5A3.375 3.375 0 0 0 6.375 7.5H5.25m11.9-3.664A2.251 2.251 0 0 0 15 2.25h-1.5a2.251 2.251 0 0 0-2.15 1.586m5.8 0c.065.21.1.433.1.664v.75h-6V4.5c0-.231.035-.454.1-.664M6.75 7.5H4.875c-.621 0-1.125.504-1.125 1.125v12c0 .621.504 1.125 1.125 1.125h9.75c.621 0 1.125-.504 1.125-1.125V16.5a9 9 0 0 0-9-9Z";

const COPY_BUTTON_CLASS: &str =
    "absolute top-0 right-0 p-1.5 md:p-2.5 bg-transparent hover:text-gray-500 cursor-pointer";
const COPY_ICON_CLASS: &str = "size-5 md:size-6";
const COPY_WRAPPER_CLASS: &str = "relative";

const HEADER_CLASS: &str =
    "bg-gray-50 font-mono border-b border-gray-200 px-2 py-2 flex items-center h-10.25";
const HEADER_TITLE_CLASS: &str = "max-w-1/2 md:max-w-3/4";
const CARD_CLASS: &str = "not-prose rounded-lg shadow-sm border border-gray-200 overflow-hidden";

/// A pure rewrite of a rendered code block.
pub trait CodeTransformer: Send + Sync {
    /// Stable transformer name, used in errors and logs.
    fn name(&self) -> &'static str;

    /// Decorate a block.
    fn transform(&self, block: RenderedCodeBlock) -> RenderedCodeBlock;

    /// Apply to a root holding at most one code element.
    ///
    /// An empty root is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TransformError`] if the root is not a single element.
    fn apply(&self, root: Root) -> Result<Root, TransformError> {
        let block = RenderedCodeBlock::from_root(root, self.name())?;
        Ok(block.map_or_else(Root::default, |block| self.transform(block).into_root()))
    }
}

/// Adds a copy-to-clipboard button to the code element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CopyButton;

impl CopyButton {
    pub const NAME: &'static str = "add-copy-button";

    /// The button element with its clipboard icon.
    #[must_use]
    pub fn button() -> Element {
        let icon = Element::new("svg")
            .with_property("xmlns", "http://www.w3.org/2000/svg")
            .with_property("fill", "none")
            .with_property("viewBox", "0 0 24 24")
            .with_property("stroke-width", "1.5")
            .with_property("stroke", "currentColor")
            .with_property("class", COPY_ICON_CLASS)
            .with_child(
                Element::new("path")
                    .with_property("stroke-linecap", "round")
                    .with_property("stroke-linejoin", "round")
                    .with_property("d", CLIPBOARD_PATH),
            );
        Element::new("button")
            .with_property("class", COPY_BUTTON_CLASS)
            .with_child(icon)
    }
}

impl CodeTransformer for CopyButton {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, mut block: RenderedCodeBlock) -> RenderedCodeBlock {
        block.append_to_code(Self::button());
        block.wrap(Element::new("div").with_property("class", COPY_WRAPPER_CLASS), Vec::new());
        block
    }
}

/// Adds a header bar showing a title (usually the file name) above the code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    title: String,
    truncate: bool,
}

impl Header {
    pub const NAME: &'static str = "add-header";

    /// Header with `title`; long titles are cut with an ellipsis when `truncate`.
    #[must_use]
    pub fn new(title: impl Into<String>, truncate: bool) -> Self {
        Self {
            title: title.into(),
            truncate,
        }
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The header bar element.
    #[must_use]
    pub fn bar(&self) -> Element {
        let class = if self.truncate {
            format!("{HEADER_TITLE_CLASS} truncate")
        } else {
            HEADER_TITLE_CLASS.to_owned()
        };
        Element::new("div")
            .with_property("class", HEADER_CLASS)
            .with_child(
                Element::new("span")
                    .with_property("class", class)
                    .with_child(Node::text(self.title.as_str())),
            )
    }
}

impl CodeTransformer for Header {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn transform(&self, mut block: RenderedCodeBlock) -> RenderedCodeBlock {
        block.wrap(
            Element::new("div").with_property("class", CARD_CLASS),
            vec![self.bar().into()],
        );
        block
    }
}

/// Add a copy button to a rendered code block.
///
/// # Errors
///
/// Returns [`TransformError`] if `root` has more than one child or its child
/// is not an element.
pub fn add_copy_button(root: Root) -> Result<Root, TransformError> {
    CopyButton.apply(root)
}

/// Add a header bar with `title` to a rendered code block.
///
/// # Errors
///
/// Returns [`TransformError`] if `root` has more than one child or its child
/// is not an element.
pub fn add_header(root: Root, title: &str, truncate: bool) -> Result<Root, TransformError> {
    Header::new(title, truncate).apply(root)
}
