//! Document types for pipeline processing.

use std::path::Path;

use crate::build::document::ContentItem;
use crate::build::toc::HeadingNode;

/// A document being processed through the pipeline.
///
/// Wraps the loaded `ContentItem` with state that evolves through the
/// stages:
///
/// 1. Initially: `content` = markdown body, `toc` = empty
/// 2. After math: math blocks wrapped in containers
/// 3. After toc: `toc` = populated
/// 4. After markdown: `content` = HTML fragment
/// 5. After template: `output_html` = final page HTML
#[derive(Debug)]
pub struct ProcessingDocument {
    pub item: ContentItem,

    /// Content being processed.
    pub content: String,

    /// Two-level heading outline.
    pub toc: Vec<HeadingNode>,

    /// Final HTML output after template rendering.
    pub output_html: Option<String>,
}

impl ProcessingDocument {
    pub fn new(item: ContentItem) -> Self {
        let content = item.body.clone();
        Self {
            item,
            content,
            toc: Vec::new(),
            output_html: None,
        }
    }

    /// Source path relative to the content root, for error messages.
    pub fn source_path(&self) -> &Path {
        &self.item.source_path
    }

    /// Output location relative to the output root.
    pub fn output_path(&self) -> &str {
        &self.item.output_path
    }
}
