//! Configuration Loader
//!
//! Handles loading and merging configuration from multiple sources with proper precedence.

use crate::global::GlobalConfig;
use crate::project::ProjectConfig;
use crate::settings::{LoaderConfig, LoaderSettings, OutputConfig, OutputFormat};
use crate::{validate_repository, ConfigResult, PROJECT_CONFIG_FILE};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Configuration loader
///
/// Loads configuration from multiple sources and merges them with proper precedence:
/// 1. Global config (~/.kiln/config.toml) - lowest priority
/// 2. Project config (./kiln.toml) - overrides global
/// 3. Environment variables (KILN_*) - overrides project
/// 4. CLI flags - highest priority (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration result
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    /// Directory where kiln.toml was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use an explicit global config file instead of ~/.kiln/config.toml
    pub fn with_global_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Load configuration starting from the given directory
    ///
    /// Walks up the directory tree to find kiln.toml, then loads and merges
    /// global config if it exists.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = self.find_project_config(start_dir)?;
        let global = self.load_global_config()?;

        let config = Config {
            project,
            global,
            project_root,
        };
        self.apply_env_overrides(config)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project = ProjectConfig::load_from_file(config_path)?;
        let global = self.load_global_config()?;

        let config = Config {
            project,
            global,
            project_root: config_path.parent().map(|p| p.to_path_buf()),
        };
        self.apply_env_overrides(config)
    }

    /// Find project configuration by walking up directory tree
    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.is_file() {
                debug!(path = %config_path.display(), "loading project config");
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// Load global configuration; a missing file or home directory yields defaults
    fn load_global_config(&mut self) -> ConfigResult<GlobalConfig> {
        if self.global_config_path.is_none() {
            match GlobalConfig::global_config_path() {
                Ok(path) => self.global_config_path = Some(path),
                Err(_) => return Ok(GlobalConfig::default()),
            }
        }

        let Some(path) = self.global_config_path.as_ref() else {
            return Ok(GlobalConfig::default());
        };

        if !path.exists() {
            return Ok(GlobalConfig::default());
        }

        debug!(path = %path.display(), "loading global config");
        GlobalConfig::load_from_file(path)
    }

    /// Apply environment variable overrides
    ///
    /// - KILN_STRICT=true|false
    /// - KILN_DEFAULT_REPOSITORIES=mavenCentral,https://repo.example.com/
    /// - KILN_FORMAT=text|json
    /// - KILN_NO_COLOR / NO_COLOR
    fn apply_env_overrides(&self, mut config: Config) -> ConfigResult<Config> {
        if let Ok(strict) = env::var("KILN_STRICT") {
            let strict = matches!(strict.to_lowercase().as_str(), "true" | "1" | "yes");
            config
                .project
                .loader
                .get_or_insert_with(LoaderConfig::default)
                .strict = Some(strict);
        }

        if let Ok(repos) = env::var("KILN_DEFAULT_REPOSITORIES") {
            let repos: Vec<String> = repos
                .split(',')
                .map(|r| r.trim().to_string())
                .filter(|r| !r.is_empty())
                .collect();
            for repo in &repos {
                validate_repository("KILN_DEFAULT_REPOSITORIES", repo)?;
            }
            config
                .project
                .loader
                .get_or_insert_with(LoaderConfig::default)
                .default_repositories = Some(repos);
        }

        if let Ok(format) = env::var("KILN_FORMAT") {
            let format: OutputFormat = format.parse()?;
            config
                .global
                .output
                .get_or_insert_with(OutputConfig::default)
                .format = Some(format);
        }

        if env::var_os("KILN_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some() {
            config
                .global
                .output
                .get_or_insert_with(OutputConfig::default)
                .color = Some(false);
        }

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Effective strict mode (project > global > false)
    pub fn strict(&self) -> bool {
        self.project
            .strict()
            .or_else(|| self.global.loader.as_ref().and_then(|l| l.strict))
            .unwrap_or(false)
    }

    /// Effective default repositories (project > global > none)
    pub fn default_repositories(&self) -> Vec<String> {
        self.project
            .default_repositories()
            .or_else(|| {
                self.global
                    .loader
                    .as_ref()
                    .and_then(|l| l.default_repositories.as_deref())
            })
            .map(|r| r.to_vec())
            .unwrap_or_default()
    }

    /// Global mirrors with project entries taking precedence
    pub fn mirrors(&self) -> BTreeMap<String, String> {
        let mut mirrors = self.global.mirrors.clone();
        mirrors.extend(self.project.mirrors.clone());
        mirrors
    }

    pub fn output_format(&self) -> OutputFormat {
        self.global
            .output
            .as_ref()
            .and_then(|o| o.format)
            .unwrap_or_default()
    }

    pub fn color(&self) -> bool {
        self.global
            .output
            .as_ref()
            .and_then(|o| o.color)
            .unwrap_or(true)
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Settings for the descriptor loader
    pub fn loader_settings(&self) -> LoaderSettings {
        LoaderSettings {
            strict: self.strict(),
            default_repositories: self.default_repositories(),
            mirrors: self.mirrors(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn isolated_loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new().with_global_config_path(dir.join("no-global.toml"))
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            "[loader]\nstrict = true\n",
        )
        .unwrap();

        let sub_dir = temp_dir.path().join("lib");
        fs::create_dir(&sub_dir).unwrap();

        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(&sub_dir).unwrap();

        assert!(config.strict());
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_env_override_strict() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(PROJECT_CONFIG_FILE),
            "[loader]\nstrict = false\n",
        )
        .unwrap();

        env::set_var("KILN_STRICT", "1");
        let mut loader = isolated_loader(temp_dir.path());
        let config = loader.load_from_directory(temp_dir.path());
        env::remove_var("KILN_STRICT");

        assert!(config.unwrap().strict());
    }

    #[test]
    #[serial]
    fn test_env_invalid_format() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("KILN_FORMAT", "xml");
        let mut loader = isolated_loader(temp_dir.path());
        let result = loader.load_from_directory(temp_dir.path());
        env::remove_var("KILN_FORMAT");

        assert!(result.is_err());
    }

    #[test]
    fn test_defaults_without_files() {
        let config = Config::default();
        assert!(!config.strict());
        assert!(config.default_repositories().is_empty());
        assert_eq!(config.output_format(), OutputFormat::Text);
        assert!(config.color());
    }
}
