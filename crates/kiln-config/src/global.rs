//! Global Configuration (~/.kiln/config.toml)
//!
//! Handles user-level configuration stored in `~/.kiln/config.toml`.

use crate::settings::{validate_mirrors, LoaderConfig, OutputConfig};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.kiln/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Loader defaults for every project
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loader: Option<LoaderConfig>,

    /// CLI output preferences
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<OutputConfig>,

    /// Repository URL rewrites
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub mirrors: BTreeMap<String, String>,
}

impl GlobalConfig {
    /// Load global configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config = Self::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(loader) = &self.loader {
            loader.validate()?;
        }
        validate_mirrors(&self.mirrors)
    }

    /// Get the global configuration directory (~/.kiln)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".kiln"))
    }

    /// Get the global configuration file path (~/.kiln/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        Ok(Self::global_config_dir()?.join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputFormat;

    #[test]
    fn test_parse_global_config() {
        let config = GlobalConfig::from_str(
            r#"
[loader]
strict = true

[output]
format = "json"
color = false

[mirrors]
"https://repo.maven.apache.org/maven2/" = "https://nexus.internal/maven2/"
"#,
        )
        .unwrap();

        assert_eq!(config.loader.as_ref().unwrap().strict, Some(true));
        let output = config.output.as_ref().unwrap();
        assert_eq!(output.format, Some(OutputFormat::Json));
        assert_eq!(output.color, Some(false));
        assert_eq!(config.mirrors.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(GlobalConfig::from_str("[output]\ntheme = \"dark\"\n").is_err());
    }

    #[test]
    fn test_invalid_mirror_rejected() {
        let config = GlobalConfig::from_str(
            "[mirrors]\n\"https://repo.maven.apache.org/maven2/\" = \"nexus\"\n",
        )
        .unwrap();
        assert!(config.validate().is_err());
    }
}
