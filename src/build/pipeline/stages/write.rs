//! File writing stage.

use crate::build::paths::{output_file, write_file};
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that writes rendered documents to their output path, creating
/// parent directories as needed.
pub struct WriteStage;

impl Stage for WriteStage {
    fn name(&self) -> &'static str {
        "write"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            let html = doc.output_html.as_ref().ok_or_else(|| {
                PipelineError::stage(
                    "write",
                    format!(
                        "document '{}' has no output HTML (was template stage run?)",
                        doc.source_path().display()
                    ),
                )
            })?;

            let output_path = output_file(ctx.output_dir, doc.output_path());
            write_file(&output_path, html).map_err(|e| PipelineError::Io {
                path: output_path.clone(),
                source: e,
            })?;

            tracing::debug!(path = %output_path.display(), "wrote page");
            ctx.pages_written += 1;
        }
        Ok(())
    }
}
