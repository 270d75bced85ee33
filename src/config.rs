//! Configuration loading and types for folio.
//!
//! This module handles all aspects of configuration:
//! - Type definitions for config structures (`types`)
//! - Loading configs from files and the environment (`load`)

mod load;
mod types;

// Re-export all types for convenient access
pub use types::{MarkdownConfig, MissingDatePolicy, RootConfig};

/// Name of the config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "folio.yaml";

/// Extension names accepted in `markdown.extensions`.
pub const MARKDOWN_EXTENSIONS: &[&str] = &[
    "definition_lists",
    "footnotes",
    "gfm",
    "heading_attributes",
    "strikethrough",
    "tables",
    "tasklists",
];

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to encode config file path as a unicode string: {0}")]
    EncodePath(std::path::PathBuf),

    #[error("failed to deserialize config: {0}")]
    Deserialize(#[from] config::ConfigError),

    #[error("failed to get current working directory: {0}")]
    CwdFailure(std::io::Error),

    #[error("{0}")]
    Validation(String),
}

impl RootConfig {
    /// Check values serde cannot check on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for extension in &self.markdown.extensions {
            if !MARKDOWN_EXTENSIONS.contains(&extension.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "invalid config: unknown markdown extension '{extension}' (expected one of: {})",
                    MARKDOWN_EXTENSIONS.join(", ")
                )));
            }
        }

        let extension = self.build.extension.trim_start_matches('.');
        if extension.is_empty() || extension.contains('/') {
            return Err(ConfigError::Validation(format!(
                "invalid config: 'build.extension' must be a bare file extension, got '{}'",
                self.build.extension
            )));
        }

        if self.build.root_page.is_absolute() {
            return Err(ConfigError::Validation(
                "invalid config: 'build.root_page' must be relative to the output directory"
                    .to_string(),
            ));
        }

        Ok(())
    }
}
