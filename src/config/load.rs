//! Configuration loading from files.
//!
//! The YAML file is layered with `FOLIO__`-prefixed environment variables,
//! e.g. `FOLIO__BUILD__OUTPUT=public`.

use std::path::{Path, PathBuf};

use super::{ConfigError, DEFAULT_CONFIG_FILE, RootConfig};

/// A loaded config together with the directory its relative paths resolve against.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RootConfig,
    pub base_path: PathBuf,
}

impl RootConfig {
    /// Load the config from the command line argument, defaulting to `folio.yaml`.
    ///
    /// An explicitly named file must exist; the default file is optional.
    pub async fn load_from_arg(config_file: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
        let required = config_file.is_some();
        let config_file = config_file.unwrap_or(Path::new(DEFAULT_CONFIG_FILE));
        let config_file = if config_file.is_relative() {
            std::env::current_dir()
                .map_err(ConfigError::CwdFailure)?
                .join(config_file)
        } else {
            config_file.to_path_buf()
        };

        let config = Self::load_from_file(&config_file, required).await?;
        config.validate()?;

        Ok(LoadedConfig {
            config,
            base_path: base_path_from_config(&config_file),
        })
    }

    /// Load the config from a file path
    pub(crate) async fn load_from_file(path: &Path, required: bool) -> Result<Self, ConfigError> {
        let path_str = path
            .as_os_str()
            .to_str()
            .ok_or_else(|| ConfigError::EncodePath(path.to_path_buf()))?;

        if required && !path.exists() {
            return Err(ConfigError::Validation(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        Ok(config::Config::builder()
            .add_source(config::File::new(path_str, config::FileFormat::Yaml).required(required))
            .add_source(
                config::Environment::with_prefix("FOLIO")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("build.static")
                    .with_list_parse_key("build.include")
                    .with_list_parse_key("markdown.extensions")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<RootConfig>()?)
    }
}

/// Get the base path from a config file path (its parent directory).
pub fn base_path_from_config(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}
