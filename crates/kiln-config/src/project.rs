//! Project Configuration (kiln.toml)

use crate::settings::{validate_mirrors, LoaderConfig};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Project configuration from kiln.toml
///
/// Output preferences are user-level only and live in the global file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<LoaderConfig>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mirrors: BTreeMap<String, String>,
}

impl ProjectConfig {
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(loader) = &self.loader {
            loader.validate()?;
        }
        validate_mirrors(&self.mirrors)
    }

    pub fn strict(&self) -> Option<bool> {
        self.loader.as_ref().and_then(|l| l.strict)
    }

    pub fn default_repositories(&self) -> Option<&[String]> {
        self.loader
            .as_ref()
            .and_then(|l| l.default_repositories.as_deref())
    }
}
