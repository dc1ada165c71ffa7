//! Configuration sections shared by global and project files

use crate::{is_url, validate_repository, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// `[loader]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct LoaderConfig {
    /// Reject unknown descriptor statements instead of warning
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,

    /// Repositories used when a descriptor declares none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_repositories: Option<Vec<String>>,
}

impl LoaderConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        for repo in self.default_repositories.iter().flatten() {
            validate_repository("loader.default-repositories", repo)?;
        }
        Ok(())
    }
}

/// `[output]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,
}

/// How the CLI prints results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ConfigError::InvalidValue {
                field: "output.format".to_string(),
                reason: format!("'{}' is not one of text, json", s),
            }),
        }
    }
}

/// Validate a `[mirrors]` table: both sides must be URLs
pub(crate) fn validate_mirrors(mirrors: &BTreeMap<String, String>) -> ConfigResult<()> {
    for (from, to) in mirrors {
        if !is_url(from) {
            return Err(ConfigError::InvalidValue {
                field: "mirrors".to_string(),
                reason: format!("mirror source '{}' is not a URL", from),
            });
        }
        if !is_url(to) {
            return Err(ConfigError::InvalidValue {
                field: format!("mirrors.\"{}\"", from),
                reason: format!("mirror target '{}' is not a URL", to),
            });
        }
    }
    Ok(())
}

/// Effective settings handed to the descriptor loader
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoaderSettings {
    /// Unknown statements are errors instead of warnings
    pub strict: bool,
    /// Repository shorthands or URLs used when the descriptor declares none
    pub default_repositories: Vec<String>,
    /// Repository URL rewrites (original URL -> mirror URL)
    pub mirrors: BTreeMap<String, String>,
}

impl LoaderSettings {
    pub fn strict() -> Self {
        Self {
            strict: true,
            ..Self::default()
        }
    }

    /// Resolve a repository URL through the configured mirrors
    ///
    /// Keys match with or without a trailing slash.
    pub fn mirror_for<'a>(&'a self, url: &'a str) -> &'a str {
        let trimmed = url.trim_end_matches('/');
        self.mirrors
            .iter()
            .find(|(from, _)| from.trim_end_matches('/') == trimmed)
            .map(|(_, to)| to.as_str())
            .unwrap_or(url)
    }
}
