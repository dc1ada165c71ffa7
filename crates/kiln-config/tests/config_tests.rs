//! Configuration loading and precedence tests

use kiln_config::{ConfigError, ConfigLoader, OutputFormat};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn clear_env() {
    for var in [
        "KILN_STRICT",
        "KILN_DEFAULT_REPOSITORIES",
        "KILN_FORMAT",
        "KILN_NO_COLOR",
        "NO_COLOR",
    ] {
        env::remove_var(var);
    }
}

// ============================================================================
// Precedence
// ============================================================================

#[test]
#[serial]
fn test_project_overrides_global() {
    clear_env();
    let home = TempDir::new().unwrap();
    let project = TempDir::new().unwrap();

    let global = write(
        home.path(),
        "config.toml",
        r#"
[loader]
strict = true
default-repositories = ["google"]

[output]
format = "json"

[mirrors]
"https://repo.maven.apache.org/maven2/" = "https://global.example.com/maven2/"
"https://maven.google.com/" = "https://global.example.com/google/"
"#,
    );
    write(
        project.path(),
        "kiln.toml",
        r#"
[loader]
strict = false

[mirrors]
"https://repo.maven.apache.org/maven2/" = "https://project.example.com/maven2/"
"#,
    );

    let mut loader = ConfigLoader::new().with_global_config_path(global);
    let config = loader.load_from_directory(project.path()).unwrap();

    assert!(!config.strict());
    assert_eq!(config.default_repositories(), vec!["google".to_string()]);
    assert_eq!(config.output_format(), OutputFormat::Json);

    let mirrors = config.mirrors();
    assert_eq!(mirrors.len(), 2);
    assert_eq!(
        mirrors["https://repo.maven.apache.org/maven2/"],
        "https://project.example.com/maven2/"
    );

    let settings = config.loader_settings();
    assert!(!settings.strict);
    assert_eq!(
        settings.mirror_for("https://maven.google.com/"),
        "https://global.example.com/google/"
    );
}

#[test]
#[serial]
fn test_env_overrides_project() {
    clear_env();
    let project = TempDir::new().unwrap();
    write(
        project.path(),
        "kiln.toml",
        "[loader]\ndefault-repositories = [\"mavenCentral\"]\n",
    );

    env::set_var("KILN_DEFAULT_REPOSITORIES", "google, https://repo.example.com/maven/");
    env::set_var("NO_COLOR", "1");
    env::set_var("KILN_FORMAT", "json");

    let mut loader =
        ConfigLoader::new().with_global_config_path(project.path().join("missing.toml"));
    let config = loader.load_from_directory(project.path());
    clear_env();
    let config = config.unwrap();

    assert_eq!(
        config.default_repositories(),
        vec![
            "google".to_string(),
            "https://repo.example.com/maven/".to_string()
        ]
    );
    assert!(!config.color());
    assert_eq!(config.output_format(), OutputFormat::Json);
}

#[test]
#[serial]
fn test_env_rejects_unknown_repository() {
    clear_env();
    let project = TempDir::new().unwrap();
    env::set_var("KILN_DEFAULT_REPOSITORIES", "jcenter");

    let mut loader =
        ConfigLoader::new().with_global_config_path(project.path().join("missing.toml"));
    let result = loader.load_from_directory(project.path());
    clear_env();

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}

#[test]
#[serial]
fn test_load_from_specific_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write(dir.path(), "custom.toml", "[loader]\nstrict = true\n");

    let mut loader = ConfigLoader::new().with_global_config_path(dir.path().join("none.toml"));
    let config = loader.load_from_file(&path).unwrap();

    assert!(config.strict());
    assert_eq!(config.project_root(), Some(dir.path()));
}

// ============================================================================
// Errors
// ============================================================================

#[rstest]
#[case::bad_toml("[loader\nstrict = true\n")]
#[case::unknown_section("[compiler]\noptimize = true\n")]
#[case::output_in_project("[output]\nformat = \"json\"\n")]
#[case::wrong_type("[loader]\nstrict = \"maybe\"\n")]
#[serial]
fn test_invalid_project_config(#[case] content: &str) {
    clear_env();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "kiln.toml", content);

    let mut loader = ConfigLoader::new().with_global_config_path(dir.path().join("none.toml"));
    let result = loader.load_from_directory(dir.path());

    assert!(matches!(result, Err(ConfigError::TomlParseError { .. })));
}

#[test]
#[serial]
fn test_invalid_default_repository_in_file() {
    clear_env();
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "kiln.toml",
        "[loader]\ndefault-repositories = [\"not a repo\"]\n",
    );

    let mut loader = ConfigLoader::new().with_global_config_path(dir.path().join("none.toml"));
    let result = loader.load_from_directory(dir.path());

    assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
}
