//! Descriptor validation
//!
//! Checks that only make sense on the whole model: plugin requirements,
//! repository availability and the task graph.

use crate::codes;
use crate::lifecycle;
use crate::model::{Descriptor, Scope};
use crate::plan;
use kiln_syntax::{Diagnostic, Span};
use std::collections::HashSet;

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `api` dependency without the java-library plugin
    ApiWithoutLibrary(String),
    /// Dependencies declared but no plugin provides configurations
    NoConfigurationPlugin,
    /// Dependencies declared but nowhere to fetch them from
    NoRepository,
    DuplicatePlugin(String),
    /// `dependsOn` / `mustRunAfter` naming a task that does not exist
    UnknownTaskReference { task: String, target: String },
    CircularDependency(String),
    DuplicateTask(String),
    /// Same coordinate declared twice in the same scope (warning)
    DuplicateDependency { coordinate: String, scope: Scope },
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::ApiWithoutLibrary(coordinate) => write!(
                f,
                "'api' dependency '{}' requires the java-library plugin",
                coordinate
            ),
            ValidationError::NoConfigurationPlugin => write!(
                f,
                "Dependencies are declared but no plugin provides dependency configurations"
            ),
            ValidationError::NoRepository => {
                write!(f, "Dependencies are declared but no repository is available")
            }
            ValidationError::DuplicatePlugin(id) => {
                write!(f, "Plugin '{}' is declared more than once", id)
            }
            ValidationError::UnknownTaskReference { task, target } => {
                write!(f, "Task '{}' refers to unknown task '{}'", task, target)
            }
            ValidationError::CircularDependency(cycle) => {
                write!(f, "Circular task dependency detected: {}", cycle)
            }
            ValidationError::DuplicateTask(name) => {
                write!(f, "Task '{}' is registered more than once", name)
            }
            ValidationError::DuplicateDependency { coordinate, scope } => write!(
                f,
                "Dependency '{}' is declared more than once in '{}'",
                coordinate, scope
            ),
        }
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn code(&self) -> &'static str {
        match self {
            ValidationError::ApiWithoutLibrary(_) => codes::API_WITHOUT_LIBRARY,
            ValidationError::NoConfigurationPlugin => codes::NO_CONFIGURATION_PLUGIN,
            ValidationError::NoRepository => codes::NO_REPOSITORY,
            ValidationError::DuplicatePlugin(_) => codes::DUPLICATE_PLUGIN,
            ValidationError::UnknownTaskReference { .. } => codes::UNKNOWN_TASK_REFERENCE,
            ValidationError::CircularDependency(_) => codes::TASK_CYCLE,
            ValidationError::DuplicateTask(_) => codes::DUPLICATE_TASK,
            ValidationError::DuplicateDependency { .. } => codes::DUPLICATE_DEPENDENCY,
        }
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, ValidationError::DuplicateDependency { .. })
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            ValidationError::ApiWithoutLibrary(_) => {
                Some("apply `java-library` or declare the dependency with `implementation`")
            }
            ValidationError::NoConfigurationPlugin => {
                Some("apply `java`, `java-library` or `scala` in the plugins block")
            }
            ValidationError::NoRepository => Some(
                "declare a repository such as mavenCentral() or set loader.default-repositories in kiln.toml",
            ),
            _ => None,
        }
    }

    /// Diagnostic without a source location
    pub fn to_diagnostic(&self) -> Diagnostic {
        let diagnostic = if self.is_warning() {
            Diagnostic::warning_with_code(self.code(), self.to_string(), Span::dummy())
        } else {
            Diagnostic::error_with_code(self.code(), self.to_string(), Span::dummy())
        };
        match self.help() {
            Some(help) => diagnostic.with_help(help),
            None => diagnostic,
        }
    }
}

/// Descriptor validator
pub struct Validator;

impl Validator {
    /// Validate a descriptor, returning errors and warnings in a stable order
    ///
    /// `has_default_repositories` reports whether configured default
    /// repositories can stand in for an empty `repositories { }` block.
    pub fn validate(descriptor: &Descriptor, has_default_repositories: bool) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        errors.extend(Self::validate_plugins(descriptor));
        errors.extend(Self::validate_dependencies(descriptor, has_default_repositories));
        errors.extend(Self::validate_tasks(descriptor));

        errors
    }

    fn validate_plugins(descriptor: &Descriptor) -> Vec<ValidationError> {
        let mut seen = HashSet::new();
        let mut errors = Vec::new();
        for plugin in &descriptor.plugins {
            if !seen.insert(plugin.id.as_str()) {
                errors.push(ValidationError::DuplicatePlugin(plugin.id.clone()));
            }
        }
        errors
    }

    fn validate_dependencies(
        descriptor: &Descriptor,
        has_default_repositories: bool,
    ) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        if descriptor.dependencies.is_empty() {
            return errors;
        }

        if !descriptor.has_plugin("java-library") {
            errors.extend(
                descriptor
                    .dependencies_in(Scope::Api)
                    .map(|d| ValidationError::ApiWithoutLibrary(d.coordinate.to_string())),
            );
        }

        let provides_configurations = descriptor
            .plugins
            .iter()
            .any(|p| p.apply && lifecycle::provides_configurations(&p.id));
        if !provides_configurations {
            errors.push(ValidationError::NoConfigurationPlugin);
        }

        if descriptor.repositories.is_empty() && !has_default_repositories {
            errors.push(ValidationError::NoRepository);
        }

        let mut seen = HashSet::new();
        for dependency in &descriptor.dependencies {
            if !seen.insert(dependency) {
                errors.push(ValidationError::DuplicateDependency {
                    coordinate: dependency.coordinate.to_string(),
                    scope: dependency.scope,
                });
            }
        }

        errors
    }

    fn validate_tasks(descriptor: &Descriptor) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        let mut names = HashSet::new();
        for task in &descriptor.tasks {
            if !names.insert(task.name.as_str()) {
                errors.push(ValidationError::DuplicateTask(task.name.clone()));
            }
        }

        for task in &descriptor.tasks {
            for target in task.depends_on.iter().chain(&task.must_run_after) {
                if !names.contains(target.as_str()) {
                    errors.push(ValidationError::UnknownTaskReference {
                        task: task.name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }

        if let Some(cycle) = plan::find_cycle(&descriptor.tasks) {
            errors.push(ValidationError::CircularDependency(cycle.join(" -> ")));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, Dependency, Plugin, Repository, Task, TaskKind};
    use pretty_assertions::assert_eq;

    fn library() -> Descriptor {
        let mut descriptor = Descriptor::default();
        descriptor.plugins.push(Plugin::new("java-library"));
        descriptor
            .repositories
            .push(Repository::from_shorthand("mavenCentral").unwrap());
        descriptor.dependencies.push(Dependency::new(
            Coordinate::parse("org.apache.commons:commons-math3:3.6.1").unwrap(),
            Scope::Api,
        ));
        descriptor
    }

    fn task(name: &str, depends_on: &[&str]) -> Task {
        let mut task = Task::new(name, TaskKind::Custom, None);
        for dep in depends_on {
            task.add_dependency(*dep);
        }
        task
    }

    #[test]
    fn test_valid_library() {
        assert_eq!(Validator::validate(&library(), false), vec![]);
    }

    #[test]
    fn test_api_requires_java_library() {
        let mut descriptor = library();
        descriptor.plugins[0] = Plugin::new("java");

        let errors = Validator::validate(&descriptor, false);
        assert_eq!(
            errors,
            vec![ValidationError::ApiWithoutLibrary(
                "org.apache.commons:commons-math3:3.6.1".to_string()
            )]
        );
        assert_eq!(errors[0].code(), "K4001");
    }

    #[test]
    fn test_dependencies_need_plugin_and_repository() {
        let mut descriptor = library();
        descriptor.plugins.clear();
        descriptor.repositories.clear();
        descriptor.dependencies[0].scope = Scope::Implementation;

        assert_eq!(
            Validator::validate(&descriptor, false),
            vec![
                ValidationError::NoConfigurationPlugin,
                ValidationError::NoRepository
            ]
        );

        descriptor.plugins.push(Plugin::new("scala"));
        assert_eq!(Validator::validate(&descriptor, true), vec![]);
    }

    #[test]
    fn test_duplicates() {
        let mut descriptor = library();
        descriptor.plugins.push(Plugin::new("java-library"));
        let dependency = descriptor.dependencies[0].clone();
        descriptor.dependencies.push(dependency);

        let errors = Validator::validate(&descriptor, false);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0], ValidationError::DuplicatePlugin("java-library".to_string()));
        assert!(errors[1].is_warning());
        assert!(!errors[1].to_diagnostic().is_error());
    }

    #[test]
    fn test_task_graph_errors() {
        let mut descriptor = Descriptor::default();
        descriptor.tasks = vec![
            task("a", &["b"]),
            task("b", &["a"]),
            task("c", &["missing"]),
            task("c", &[]),
        ];

        let errors = Validator::validate(&descriptor, false);
        assert_eq!(
            errors,
            vec![
                ValidationError::DuplicateTask("c".to_string()),
                ValidationError::UnknownTaskReference {
                    task: "c".to_string(),
                    target: "missing".to_string()
                },
                ValidationError::CircularDependency("a -> b -> a".to_string()),
            ]
        );
    }
}
