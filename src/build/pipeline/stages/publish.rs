//! Root page publishing.

use crate::build::paths::{SECTION_INDEX, output_file};
use crate::build::pipeline::{FinalizeStage, PipelineContext, PipelineError};

/// Copies an already-written page to `index.html` at the output root.
pub struct PublishRootStage {
    /// Page to publish, relative to the output root
    root_page: String,
}

impl PublishRootStage {
    pub fn new(root_page: impl Into<String>) -> Self {
        Self {
            root_page: root_page.into(),
        }
    }
}

impl FinalizeStage for PublishRootStage {
    fn name(&self) -> &'static str {
        "publish-root"
    }

    fn finalize(&self, ctx: &PipelineContext) -> Result<(), PipelineError> {
        let from = output_file(ctx.output_dir, &self.root_page);
        if !from.is_file() {
            return Err(PipelineError::MissingRootPage(from));
        }

        let to = ctx.output_dir.join(SECTION_INDEX);
        std::fs::copy(&from, &to).map_err(|e| PipelineError::Io {
            path: to.clone(),
            source: e,
        })?;

        tracing::info!(from = %self.root_page, "published root page");
        Ok(())
    }
}
