//! Descriptor loader
//!
//! Parses descriptor text, interprets it, validates the result, then resolves
//! dependencies and plans every task. Any error diagnostic rejects the
//! descriptor with [`DescriptorError::MalformedDescriptor`].

use crate::codes;
use crate::interpret::Interpreter;
use crate::lifecycle;
use crate::manifest::toml_diagnostic;
use crate::model::{Descriptor, Repository};
use crate::plan::{ExecutionPlan, PlanError};
use crate::resolve::DependencySet;
use crate::validator::{ValidationError, Validator};
use crate::{DescriptorError, DescriptorResult};
use kiln_config::LoaderSettings;
use kiln_syntax::{sort_diagnostics, Diagnostic, Span};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

const INPUT: &str = "<input>";

/// Loads build descriptors
#[derive(Debug, Clone, Default)]
pub struct DescriptorLoader {
    settings: LoaderSettings,
}

/// A validated descriptor with its plan and resolved dependencies
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDescriptor {
    pub descriptor: Descriptor,
    /// Every task, in execution order
    pub tasks: Vec<String>,
    pub plan: ExecutionPlan,
    pub dependencies: DependencySet,
    /// Non-fatal diagnostics
    pub warnings: Vec<Diagnostic>,
}

impl DescriptorLoader {
    /// Lenient loader without default repositories or mirrors
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: LoaderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &LoaderSettings {
        &self.settings
    }

    /// Load Kotlin-DSL descriptor text
    pub fn load_str(&self, source: &str) -> DescriptorResult<LoadedDescriptor> {
        self.load_dsl(source, INPUT)
    }

    /// Load TOML descriptor text
    pub fn load_toml_str(&self, source: &str) -> DescriptorResult<LoadedDescriptor> {
        self.load_toml(source, INPUT)
    }

    /// Load a descriptor file; `.toml` files use the TOML form
    pub fn load_file(&self, path: &Path) -> DescriptorResult<LoadedDescriptor> {
        let source = std::fs::read_to_string(path).map_err(|error| DescriptorError::Read {
            path: path.to_path_buf(),
            error,
        })?;
        let file = path.display().to_string();

        if path.extension().is_some_and(|ext| ext == "toml") {
            self.load_toml(&source, &file)
        } else {
            self.load_dsl(&source, &file)
        }
    }

    fn load_dsl(&self, source: &str, file: &str) -> DescriptorResult<LoadedDescriptor> {
        debug!(file, strict = self.settings.strict, "loading descriptor");
        let source = kiln_syntax::strip_byte_order_mark(source);

        let (script, mut diagnostics) = kiln_syntax::parse_script(source);
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(malformed(diagnostics, file));
        }

        let (descriptor, interpretation) = Interpreter::new(self.settings.strict).interpret(&script);
        diagnostics.extend(interpretation.into_iter().map(|mut d| {
            d.attach_source(source);
            d
        }));

        self.finish(descriptor, diagnostics, file)
    }

    fn load_toml(&self, source: &str, file: &str) -> DescriptorResult<LoadedDescriptor> {
        debug!(file, "loading TOML descriptor");

        let mut descriptor: Descriptor = toml::from_str(source)
            .map_err(|e| malformed(vec![toml_diagnostic(&e, source)], file))?;
        register_plugin_tasks(&mut descriptor);

        // `type = "Test"` implies default test settings
        for task in &mut descriptor.tasks {
            if task.is_type("Test") && task.test.is_none() {
                task.test = Some(Default::default());
            }
        }

        self.finish(descriptor, Vec::new(), file)
    }

    fn finish(
        &self,
        mut descriptor: Descriptor,
        mut diagnostics: Vec<Diagnostic>,
        file: &str,
    ) -> DescriptorResult<LoadedDescriptor> {
        let default_repositories = self.default_repositories();

        diagnostics.extend(
            Validator::validate(&descriptor, !default_repositories.is_empty())
                .iter()
                .map(ValidationError::to_diagnostic),
        );
        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(malformed(diagnostics, file));
        }

        let mut seen = HashSet::new();
        descriptor.dependencies.retain(|d| seen.insert(d.clone()));

        let repositories = if descriptor.repositories.is_empty() {
            if !descriptor.dependencies.is_empty() {
                debug!(repositories = ?self.settings.default_repositories, "using default repositories");
            }
            &default_repositories
        } else {
            &descriptor.repositories
        };

        let dependencies =
            DependencySet::resolve(&descriptor.dependencies, repositories, &self.settings)
                .ok_or_else(|| {
                    malformed(vec![ValidationError::NoRepository.to_diagnostic()], file)
                })?;

        let plan = ExecutionPlan::full(&descriptor)
            .map_err(|e| malformed(vec![plan_diagnostic(&e)], file))?;

        let warnings: Vec<Diagnostic> = diagnostics
            .into_iter()
            .map(|d| d.with_file(file))
            .collect();
        for warning in &warnings {
            warn!(code = %warning.code, line = warning.line, "{}", warning.message);
        }

        info!(
            file,
            tasks = plan.len(),
            dependencies = dependencies.len(),
            warnings = warnings.len(),
            "descriptor loaded"
        );

        Ok(LoadedDescriptor {
            tasks: plan.steps.iter().map(|s| s.name.clone()).collect(),
            descriptor,
            plan,
            dependencies,
            warnings,
        })
    }

    fn default_repositories(&self) -> Vec<Repository> {
        self.settings
            .default_repositories
            .iter()
            .filter_map(|r| Repository::from_setting(r))
            .collect()
    }
}

impl Descriptor {
    /// Interpret and validate Kotlin-DSL text with default settings
    pub fn from_dsl_str(source: &str) -> DescriptorResult<Self> {
        DescriptorLoader::new()
            .load_str(source)
            .map(|loaded| loaded.descriptor)
    }
}

/// Put the built-in tasks of applied plugins ahead of the declared tasks
///
/// A declared task replaces the built-in task of the same name in place.
fn register_plugin_tasks(descriptor: &mut Descriptor) {
    let mut tasks = Vec::new();
    for plugin in descriptor.plugins.iter().filter(|p| p.apply) {
        if lifecycle::is_lifecycle_plugin(&plugin.id) {
            lifecycle::register_builtin_tasks(&plugin.id, &mut tasks);
        }
    }
    if tasks.is_empty() {
        return;
    }
    debug!(builtin = tasks.len(), "registered plugin tasks");

    for task in std::mem::take(&mut descriptor.tasks) {
        match tasks.iter_mut().find(|t| t.name == task.name) {
            Some(builtin) => *builtin = task,
            None => tasks.push(task),
        }
    }
    descriptor.tasks = tasks;
}

fn malformed(mut diagnostics: Vec<Diagnostic>, file: &str) -> DescriptorError {
    for diagnostic in &mut diagnostics {
        diagnostic.file = file.to_string();
    }
    sort_diagnostics(&mut diagnostics);
    DescriptorError::MalformedDescriptor { diagnostics }
}

fn plan_diagnostic(error: &PlanError) -> Diagnostic {
    let code = match error {
        PlanError::CircularDependency(_) => codes::TASK_CYCLE,
        PlanError::TaskNotFound(_) => codes::UNKNOWN_TASK_REFERENCE,
    };
    Diagnostic::error_with_code(code, error.to_string(), Span::dummy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scope;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_empty_descriptor() {
        let loaded = DescriptorLoader::new().load_str("").unwrap();
        assert!(loaded.tasks.is_empty());
        assert!(loaded.dependencies.is_empty());
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn test_default_repositories_fill_in() {
        let source = r#"
plugins { java }
dependencies { implementation("com.google.guava:guava:30.1-jre") }
"#;
        assert!(DescriptorLoader::new().load_str(source).is_err());

        let settings = LoaderSettings {
            default_repositories: vec!["google".to_string()],
            ..LoaderSettings::default()
        };
        let loaded = DescriptorLoader::with_settings(settings).load_str(source).unwrap();

        assert!(loaded.descriptor.repositories.is_empty());
        let resolved = loaded.dependencies.iter().next().unwrap();
        assert_eq!(resolved.repository, "Google");
        assert_eq!(resolved.scope, Scope::Implementation);
    }

    #[test]
    fn test_toml_duplicates_collapse_with_warning() {
        let source = r#"
[[plugins]]
id = "java"

[[repositories]]
name = "MavenRepo"
url = "https://repo.maven.apache.org/maven2/"

[[dependencies]]
coordinate = "junit:junit:4.13.2"
scope = "testImplementation"

[[dependencies]]
coordinate = "junit:junit:4.13.2"
scope = "testImplementation"
"#;
        let loaded = DescriptorLoader::new().load_toml_str(source).unwrap();
        assert_eq!(loaded.descriptor.dependencies.len(), 1);
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].code, codes::DUPLICATE_DEPENDENCY);
    }

    #[test]
    fn test_toml_plugins_register_builtin_tasks() {
        let toml = r#"
[[plugins]]
id = "java"

[[tasks]]
name = "hello"
depends-on = ["jar"]

[[tasks]]
name = "jar"
type = "Jar"
group = "packaging"
depends-on = ["classes"]
"#;
        let from_toml = DescriptorLoader::new().load_toml_str(toml).unwrap();
        let from_dsl = DescriptorLoader::new()
            .load_str("plugins { java }
tasks.register(\"hello\") { dependsOn(\"jar\") }
")
            .unwrap();

        let names = |tasks: &[crate::model::Task]| -> Vec<String> {
            tasks.iter().map(|t| t.name.clone()).collect()
        };
        assert_eq!(from_toml.descriptor.tasks.len(), 14);
        assert_eq!(names(&from_toml.descriptor.tasks), names(&from_dsl.descriptor.tasks));
        assert_eq!(from_toml.tasks, from_dsl.tasks);
        let jar = from_toml.descriptor.task("jar").unwrap();
        assert_eq!(jar.group.as_deref(), Some("packaging"));
        assert!(from_toml.descriptor.task("test").unwrap().test.is_some());
    }

    #[test]
    fn test_unapplied_toml_plugin_registers_nothing() {
        let loaded = DescriptorLoader::new()
            .load_toml_str("[[plugins]]\nid = \"java\"\napply = false\n")
            .unwrap();
        assert!(loaded.tasks.is_empty());
    }

    #[test]
    fn test_must_run_after_cycle_is_malformed() {
        let source = r#"
[[tasks]]
name = "a"
must-run-after = ["b"]

[[tasks]]
name = "b"
must-run-after = ["a"]
"#;
        let err = DescriptorLoader::new().load_toml_str(source).unwrap_err();
        assert_eq!(err.diagnostics()[0].code, codes::TASK_CYCLE);
        assert!(err.to_string().contains("a -> b -> a"));
    }
}
