//! Kiln Configuration System
//!
//! Provides configuration management for the kiln descriptor loader:
//! - Global user configuration (~/.kiln/config.toml)
//! - Project configuration (kiln.toml, found by walking up from the descriptor)
//! - Environment variable overrides (KILN_*)
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Global config (~/.kiln/config.toml)
//! 2. Project config (./kiln.toml)
//! 3. Environment variables (KILN_*)
//! 4. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use kiln_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! let settings = config.loader_settings();
//! ```

pub mod global;
pub mod loader;
pub mod project;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader};
pub use project::ProjectConfig;
pub use settings::{LoaderConfig, LoaderSettings, OutputConfig, OutputFormat};

/// Name of the project configuration file
pub const PROJECT_CONFIG_FILE: &str = "kiln.toml";

/// Repository shorthands understood in `default-repositories`
pub const REPOSITORY_SHORTHANDS: &[&str] =
    &["mavenCentral", "google", "mavenLocal", "gradlePluginPortal"];

/// Check a repository entry: a known shorthand or a URL
pub(crate) fn validate_repository(field: &str, value: &str) -> ConfigResult<()> {
    if REPOSITORY_SHORTHANDS.contains(&value) || is_url(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!(
                "'{}' is neither a URL nor one of {}",
                value,
                REPOSITORY_SHORTHANDS.join(", ")
            ),
        })
    }
}

pub(crate) fn is_url(value: &str) -> bool {
    ["https://", "http://", "file:/"]
        .iter()
        .any(|scheme| value.starts_with(scheme) && value.len() > scheme.len())
}
