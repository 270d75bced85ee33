//! Markdown rendering stage.

use crate::build::markdown::render_markdown;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that renders document content from markdown to HTML.
///
/// After this stage, `doc.content` contains the HTML fragment.
pub struct MarkdownStage;

impl Stage for MarkdownStage {
    fn name(&self) -> &'static str {
        "markdown"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            doc.content = render_markdown(&doc.content, ctx.markdown_config).map_err(|e| {
                PipelineError::Markdown {
                    path: doc.source_path().to_path_buf(),
                    source: e,
                }
            })?;
        }
        Ok(())
    }
}
