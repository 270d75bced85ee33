//! Table of contents stage.

use crate::build::markdown::parser_options;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};
use crate::build::toc::build_toc;

/// Stage that extracts the heading outline from the markdown.
///
/// Runs on the same text and parser options the markdown stage renders, so
/// every outline id names a rendered heading.
pub struct TocStage;

impl Stage for TocStage {
    fn name(&self) -> &'static str {
        "toc"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let options =
                parser_options(ctx.markdown_config).map_err(|e| PipelineError::Markdown {
                    path: doc.source_path().to_path_buf(),
                    source: e,
                })?;
            doc.toc = build_toc(&doc.content, options);
        }
        Ok(())
    }
}
