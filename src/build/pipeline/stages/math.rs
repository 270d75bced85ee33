use crate::build::markdown::preprocess_math_blocks;
use crate::build::pipeline::{PipelineContext, PipelineError, ProcessingDocument, Stage};

/// Stage that wraps display math in block containers before markdown
/// rendering, so the markdown parser leaves it alone.
pub struct MathStage;

impl Stage for MathStage {
    fn name(&self) -> &'static str {
        "math"
    }

    fn process(
        &self,
        docs: &mut [ProcessingDocument],
        _ctx: &mut PipelineContext,
    ) -> Result<(), PipelineError> {
        for doc in docs {
            doc.content = preprocess_math_blocks(&doc.content);
        }
        Ok(())
    }
}
