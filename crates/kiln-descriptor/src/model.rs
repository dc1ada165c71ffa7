//! Descriptor data model
//!
//! The model is plain immutable data: what a build descriptor declares after
//! interpretation. It serializes to and from the TOML descriptor form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// A fully interpreted build descriptor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Descriptor {
    #[serde(default)]
    pub project: ProjectInfo,
    #[serde(default)]
    pub plugins: Vec<Plugin>,
    #[serde(default)]
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    /// Tasks in registration order
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Descriptor {
    pub fn task(&self, name: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn task_mut(&mut self, name: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.name == name)
    }

    pub fn has_task(&self, name: &str) -> bool {
        self.task(name).is_some()
    }

    /// Whether a plugin is declared and applied
    pub fn has_plugin(&self, id: &str) -> bool {
        self.plugins.iter().any(|p| p.apply && p.id == id)
    }

    pub fn dependencies_in(&self, scope: Scope) -> impl Iterator<Item = &Dependency> {
        self.dependencies.iter().filter(move |d| d.scope == scope)
    }
}

/// Project-level properties (`group = ...`, `version = ...`)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProjectInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Plugin declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plugin {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// `apply false` declares the plugin without applying it
    #[serde(default = "default_true")]
    pub apply: bool,
}

impl Plugin {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: None,
            apply: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Repository source dependencies are fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub url: String,
}

impl Repository {
    pub const MAVEN_CENTRAL_URL: &'static str = "https://repo.maven.apache.org/maven2/";
    pub const GOOGLE_URL: &'static str = "https://dl.google.com/dl/android/maven2/";
    pub const PLUGIN_PORTAL_URL: &'static str = "https://plugins.gradle.org/m2/";

    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// Well-known repository by its DSL shorthand (`mavenCentral`, `google`, ...)
    pub fn from_shorthand(shorthand: &str) -> Option<Self> {
        match shorthand {
            "mavenCentral" => Some(Self::new("MavenRepo", Self::MAVEN_CENTRAL_URL)),
            "google" => Some(Self::new("Google", Self::GOOGLE_URL)),
            "gradlePluginPortal" => Some(Self::new(
                "Gradle Central Plugin Repository",
                Self::PLUGIN_PORTAL_URL,
            )),
            "mavenLocal" => {
                let home = dirs::home_dir()
                    .map(|h| h.display().to_string())
                    .unwrap_or_else(|| "~".to_string());
                Some(Self::new(
                    "MavenLocal",
                    format!("file://{}/.m2/repository/", home.trim_end_matches('/')),
                ))
            }
            _ => None,
        }
    }

    /// Repository from a configured default: a shorthand or a URL
    pub fn from_setting(value: &str) -> Option<Self> {
        Self::from_shorthand(value).or_else(|| {
            is_repository_url(value).then(|| Self::new(value.to_string(), value.to_string()))
        })
    }
}

pub(crate) fn is_repository_url(url: &str) -> bool {
    ["https://", "http://", "file:/"]
        .iter()
        .any(|scheme| url.starts_with(scheme) && url.len() > scheme.len())
}

/// `group:artifact:version`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Coordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

/// Why a coordinate string was rejected
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoordinateError {
    #[error("missing {0}")]
    MissingPart(&'static str),
    #[error("expected 'group:artifact:version' but found {0} parts")]
    WrongPartCount(usize),
    #[error("{part} '{value}' contains invalid characters")]
    InvalidCharacters { part: &'static str, value: String },
}

impl Coordinate {
    /// Build a coordinate from its parts, checking each one
    pub fn new(
        group: impl Into<String>,
        artifact: impl Into<String>,
        version: impl Into<String>,
    ) -> Result<Self, CoordinateError> {
        let coordinate = Self {
            group: group.into(),
            artifact: artifact.into(),
            version: version.into(),
        };
        coordinate.check()?;
        Ok(coordinate)
    }

    /// Parse `group:artifact:version`
    pub fn parse(s: &str) -> Result<Self, CoordinateError> {
        let parts: Vec<&str> = s.split(':').collect();
        match parts.as_slice() {
            [group, artifact, version] => Self::new(*group, *artifact, *version),
            // The empty version always fails, after any missing group or artifact
            [group, artifact] => Self::new(*group, *artifact, ""),
            [single] if single.is_empty() => Err(CoordinateError::MissingPart("group")),
            [_] => Err(CoordinateError::MissingPart("artifact")),
            _ => Err(CoordinateError::WrongPartCount(parts.len())),
        }
    }

    fn check(&self) -> Result<(), CoordinateError> {
        for (part, value) in [
            ("group", &self.group),
            ("artifact", &self.artifact),
            ("version", &self.version),
        ] {
            if value.is_empty() {
                return Err(CoordinateError::MissingPart(part));
            }
        }

        let name_ok = |s: &str| {
            s.chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        };
        if !name_ok(&self.group) {
            return Err(CoordinateError::InvalidCharacters {
                part: "group",
                value: self.group.clone(),
            });
        }
        if !name_ok(&self.artifact) {
            return Err(CoordinateError::InvalidCharacters {
                part: "artifact",
                value: self.artifact.clone(),
            });
        }
        if self
            .version
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '\\'))
        {
            return Err(CoordinateError::InvalidCharacters {
                part: "version",
                value: self.version.clone(),
            });
        }
        Ok(())
    }

    /// `group:artifact` without the version
    pub fn module(&self) -> String {
        format!("{}:{}", self.group, self.artifact)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group, self.artifact, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Coordinate {
    type Error = CoordinateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Coordinate> for String {
    fn from(value: Coordinate) -> Self {
        value.to_string()
    }
}

/// Visibility classification of a dependency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// `implementation`: compile-time internal, hidden from consumers' compile classpath
    Implementation,
    /// `api`: exported to consumers' compile classpath
    Api,
    /// `testImplementation`
    TestImplementation,
    /// `testRuntimeOnly`
    TestRuntimeOnly,
}

impl Scope {
    pub const ALL: [Scope; 4] = [
        Scope::Implementation,
        Scope::Api,
        Scope::TestImplementation,
        Scope::TestRuntimeOnly,
    ];

    /// Name of the DSL configuration declaring this scope
    pub fn configuration_name(&self) -> &'static str {
        match self {
            Scope::Implementation => "implementation",
            Scope::Api => "api",
            Scope::TestImplementation => "testImplementation",
            Scope::TestRuntimeOnly => "testRuntimeOnly",
        }
    }

    /// Descriptive visibility tag
    pub fn tag(&self) -> &'static str {
        match self {
            Scope::Implementation => "compile-time-internal",
            Scope::Api => "exported-api",
            Scope::TestImplementation => "test-only",
            Scope::TestRuntimeOnly => "test-runtime-only",
        }
    }

    pub fn from_configuration(name: &str) -> Option<Scope> {
        Self::ALL
            .into_iter()
            .find(|s| s.configuration_name() == name)
    }

    pub fn is_test(&self) -> bool {
        matches!(self, Scope::TestImplementation | Scope::TestRuntimeOnly)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.configuration_name())
    }
}

/// A dependency with exactly one scope
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
    pub coordinate: Coordinate,
    pub scope: Scope,
}

impl Dependency {
    pub fn new(coordinate: Coordinate, scope: Scope) -> Self {
        Self { coordinate, scope }
    }
}

/// Where a task comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Registered by a plugin
    Builtin,
    /// Registered by the descriptor itself
    #[default]
    Custom,
}

/// A named unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub kind: TaskKind,
    /// Simple task type name (`Jar`, `Test`, ...)
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, rename = "depends-on", skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, rename = "must-run-after", skip_serializing_if = "Vec::is_empty")]
    pub must_run_after: Vec<String>,
    /// Rendered `from(...)` inputs
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<TestSettings>,
}

impl Task {
    pub fn new(name: impl Into<String>, kind: TaskKind, task_type: Option<String>) -> Self {
        let test = (task_type.as_deref() == Some("Test")).then(TestSettings::default);
        Self {
            name: name.into(),
            kind,
            task_type,
            group: None,
            description: None,
            depends_on: Vec::new(),
            must_run_after: Vec::new(),
            inputs: Vec::new(),
            options: BTreeMap::new(),
            test,
        }
    }

    pub fn is_type(&self, type_name: &str) -> bool {
        self.task_type.as_deref() == Some(simple_type_name(type_name))
    }

    pub fn add_dependency(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.depends_on.contains(&name) {
            self.depends_on.push(name);
        }
    }

    pub fn add_must_run_after(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.must_run_after.contains(&name) {
            self.must_run_after.push(name);
        }
    }
}

/// `org.gradle.api.tasks.testing.Test` -> `Test`
pub fn simple_type_name(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

/// Configuration of a `Test` task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TestSettings {
    #[serde(default)]
    pub runner: TestRunner,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<TestLogEvent>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
    #[serde(default = "default_true")]
    pub scan_for_test_classes: bool,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            runner: TestRunner::default(),
            events: Vec::new(),
            includes: Vec::new(),
            excludes: Vec::new(),
            scan_for_test_classes: true,
        }
    }
}

/// Test framework the test task runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TestRunner {
    /// JUnit 4 (`useJUnit()`, the default)
    #[default]
    #[serde(rename = "junit")]
    JUnit,
    /// `useJUnitPlatform()`
    #[serde(rename = "junit-platform")]
    JUnitPlatform,
    /// `useTestNG()`
    #[serde(rename = "testng")]
    TestNG,
}

impl fmt::Display for TestRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestRunner::JUnit => write!(f, "junit"),
            TestRunner::JUnitPlatform => write!(f, "junit-platform"),
            TestRunner::TestNG => write!(f, "testng"),
        }
    }
}

/// Test lifecycle events reported by the test logger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestLogEvent {
    Started,
    Passed,
    Skipped,
    Failed,
    StandardOut,
    StandardError,
}

impl FromStr for TestLogEvent {
    type Err = String;

    /// Accepts `passed`, `PASSED` and `TestLogEvent.PASSED`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.rsplit('.').next().unwrap_or(s);
        match name.to_ascii_lowercase().as_str() {
            "started" => Ok(TestLogEvent::Started),
            "passed" => Ok(TestLogEvent::Passed),
            "skipped" => Ok(TestLogEvent::Skipped),
            "failed" => Ok(TestLogEvent::Failed),
            "standard_out" => Ok(TestLogEvent::StandardOut),
            "standard_error" => Ok(TestLogEvent::StandardError),
            _ => Err(format!("unknown test logging event '{}'", s)),
        }
    }
}

/// Task option value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Integer(i64),
    String(String),
    List(Vec<Value>),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::String(s) => write!(f, "{:?}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coordinate() {
        let c = Coordinate::parse("com.google.guava:guava:30.1-jre").unwrap();
        assert_eq!(c.group, "com.google.guava");
        assert_eq!(c.artifact, "guava");
        assert_eq!(c.version, "30.1-jre");
        assert_eq!(c.module(), "com.google.guava:guava");
        assert_eq!(c.to_string(), "com.google.guava:guava:30.1-jre");
    }

    #[test]
    fn test_coordinate_missing_parts() {
        assert_eq!(
            Coordinate::parse("junit:junit"),
            Err(CoordinateError::MissingPart("version"))
        );
        assert_eq!(
            Coordinate::parse("junit::4.13.2"),
            Err(CoordinateError::MissingPart("artifact"))
        );
        assert_eq!(
            Coordinate::parse(":junit:4.13.2"),
            Err(CoordinateError::MissingPart("group"))
        );
        assert_eq!(Coordinate::parse(""), Err(CoordinateError::MissingPart("group")));
    }

    #[test]
    fn test_two_part_coordinate_reports_first_missing_part() {
        assert_eq!(Coordinate::parse(":"), Err(CoordinateError::MissingPart("group")));
        assert_eq!(Coordinate::parse(":junit"), Err(CoordinateError::MissingPart("group")));
        assert_eq!(Coordinate::parse("junit:"), Err(CoordinateError::MissingPart("artifact")));
        assert_eq!(
            Coordinate::parse("org example:lib"),
            Err(CoordinateError::MissingPart("version"))
        );
        assert_eq!(
            Coordinate::parse("a:b:c:d"),
            Err(CoordinateError::WrongPartCount(4))
        );
    }

    #[test]
    fn test_coordinate_invalid_characters() {
        assert!(matches!(
            Coordinate::parse("org example:lib:1.0"),
            Err(CoordinateError::InvalidCharacters { part: "group", .. })
        ));
        assert!(matches!(
            Coordinate::parse("org.example:lib:1.0 beta"),
            Err(CoordinateError::InvalidCharacters { part: "version", .. })
        ));
    }

    #[test]
    fn test_scope_names() {
        for scope in Scope::ALL {
            assert_eq!(Scope::from_configuration(scope.configuration_name()), Some(scope));
        }
        assert_eq!(Scope::from_configuration("compileOnly"), None);
        assert_eq!(Scope::Api.tag(), "exported-api");
        assert!(Scope::TestRuntimeOnly.is_test());
        assert!(!Scope::Implementation.is_test());
    }

    #[test]
    fn test_test_log_event_from_str() {
        assert_eq!("passed".parse::<TestLogEvent>(), Ok(TestLogEvent::Passed));
        assert_eq!(
            "TestLogEvent.STANDARD_OUT".parse::<TestLogEvent>(),
            Ok(TestLogEvent::StandardOut)
        );
        assert!("exploded".parse::<TestLogEvent>().is_err());
    }

    #[test]
    fn test_new_test_task_has_settings() {
        let task = Task::new("integrationTest", TaskKind::Custom, Some("Test".to_string()));
        assert_eq!(task.test, Some(TestSettings::default()));
        assert!(task.is_type("org.gradle.api.tasks.testing.Test"));

        let jar = Task::new("sourcesJar", TaskKind::Custom, Some("Jar".to_string()));
        assert!(jar.test.is_none());
    }

    #[test]
    fn test_shorthand_repositories() {
        let central = Repository::from_shorthand("mavenCentral").unwrap();
        assert_eq!(central.url, Repository::MAVEN_CENTRAL_URL);
        assert!(Repository::from_shorthand("jcenter").is_none());
        assert!(Repository::from_setting("https://repo.example.com/").is_some());
        assert!(Repository::from_setting("not-a-repo").is_none());
    }
}
