//! Pipeline error types.

use std::path::PathBuf;

use crate::build::markdown::MarkdownError;
use crate::build::render::RenderError;

/// Errors that can occur during pipeline processing.
#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("failed to render markdown for {path}: {source}")]
    Markdown {
        path: PathBuf,
        source: MarkdownError,
    },

    #[error("failed to render template for {path}: {source}")]
    Render { path: PathBuf, source: RenderError },

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("root page {0} was not generated")]
    MissingRootPage(PathBuf),

    #[error("stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },
}

impl PipelineError {
    /// Create a stage-specific error.
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}
