pub mod check;
pub mod deps;
pub mod export;
pub mod plan;

use crate::output;
use anyhow::{Context, Result};
use kiln_config::{ConfigLoader, LoaderSettings, OutputFormat};
use kiln_descriptor::{DescriptorError, DescriptorLoader, LoadedDescriptor};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A descriptor file together with the configuration that applies to it
#[derive(Debug, Clone)]
pub struct Session {
    pub file: PathBuf,
    pub settings: LoaderSettings,
    pub json: bool,
}

impl Session {
    /// Resolve configuration from the descriptor's directory upwards
    ///
    /// Command-line flags override configuration: `--strict` forces strict
    /// mode, `--json` forces JSON output and `--no-color` disables color.
    pub fn open(file: PathBuf, strict: bool, json: bool, no_color: bool) -> Result<Self> {
        let dir = config_dir(&file);
        let config = ConfigLoader::new()
            .load_from_directory(&dir)
            .with_context(|| format!("Failed to load configuration from {}", dir.display()))?;
        debug!(root = ?config.project_root(), "configuration loaded");

        if no_color || !config.color() {
            colored::control::set_override(false);
        }

        let mut settings = config.loader_settings();
        settings.strict |= strict;

        Ok(Self {
            file,
            settings,
            json: json || config.output_format() == OutputFormat::Json,
        })
    }

    /// Load the descriptor, printing its diagnostics
    ///
    /// Text mode prints warnings and errors to stderr. JSON mode prints a
    /// failure report to stdout and leaves warnings to the command's own
    /// output.
    pub fn load(&self) -> Result<LoadedDescriptor> {
        let loader = DescriptorLoader::with_settings(self.settings.clone());

        match loader.load_file(&self.file) {
            Ok(loaded) => {
                if !self.json {
                    output::print_diagnostics(&loaded.warnings);
                }
                Ok(loaded)
            }
            Err(DescriptorError::MalformedDescriptor { diagnostics }) => {
                let errors = diagnostics.iter().filter(|d| d.is_error()).count();
                if self.json {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "file": self.file.display().to_string(),
                            "valid": false,
                            "diagnostics": output::diagnostics_json(&diagnostics),
                        }))?
                    );
                } else {
                    output::print_diagnostics(&diagnostics);
                }
                Err(anyhow::anyhow!(
                    "{}: malformed descriptor ({} error{})",
                    self.file.display(),
                    errors,
                    if errors == 1 { "" } else { "s" }
                ))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Directory to start the configuration search from
fn config_dir(file: &Path) -> PathBuf {
    let parent = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    parent.canonicalize().unwrap_or_else(|_| parent.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_of_bare_file_name() {
        let dir = config_dir(Path::new("build.gradle.kts"));
        assert_eq!(dir, Path::new(".").canonicalize().unwrap());
    }
}
