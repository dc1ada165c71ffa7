//! TOML descriptor form
//!
//! The model serializes to a TOML document so interpreted Kotlin-DSL scripts
//! can be exported, edited and loaded back without a script interpreter.

use crate::codes;
use crate::model::Descriptor;
use crate::{DescriptorError, DescriptorResult};
use kiln_syntax::{Diagnostic, Span};

impl Descriptor {
    /// Parse the TOML form without validating it
    pub fn from_toml_str(content: &str) -> DescriptorResult<Self> {
        toml::from_str(content).map_err(|e| DescriptorError::MalformedDescriptor {
            diagnostics: vec![toml_diagnostic(&e, content)],
        })
    }

    pub fn to_toml_string(&self) -> DescriptorResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

/// Diagnostic for a TOML syntax or schema error, located from its byte span
pub(crate) fn toml_diagnostic(error: &toml::de::Error, content: &str) -> Diagnostic {
    let span = match error.span() {
        Some(range) => {
            let start = range.start.min(content.len());
            let before = &content[..start];
            let line = before.matches('\n').count() + 1;
            let column = before
                .rfind('\n')
                .map(|nl| before[nl + 1..].chars().count() + 1)
                .unwrap_or_else(|| before.chars().count() + 1);
            Span::new(start, range.end.max(start + 1), line, column)
        }
        None => Span::dummy(),
    };

    let mut diagnostic =
        Diagnostic::error_with_code(codes::TOML_SYNTAX, error.message().trim(), span);
    diagnostic.attach_source(content);
    diagnostic
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, Dependency, Plugin, Scope, Task, TaskKind, Value};
    use pretty_assertions::assert_eq;

    const LIBRARY: &str = r#"
[project]
group = "com.example"
version = "1.0.0"

[[plugins]]
id = "java-library"

[[repositories]]
name = "MavenRepo"
url = "https://repo.maven.apache.org/maven2/"

[[dependencies]]
coordinate = "com.google.guava:guava:30.1-jre"
scope = "implementation"

[[dependencies]]
coordinate = "junit:junit:4.13.2"
scope = "testImplementation"

[[tasks]]
name = "sourcesJar"
type = "Jar"
depends-on = ["classes"]
inputs = ["sourceSets.main.allSource"]

[tasks.options]
archiveClassifier = "sources"
"#;

    #[test]
    fn test_parse_toml_form() {
        let descriptor = Descriptor::from_toml_str(LIBRARY).unwrap();

        assert_eq!(descriptor.project.group.as_deref(), Some("com.example"));
        assert_eq!(descriptor.plugins, vec![Plugin::new("java-library")]);
        assert_eq!(
            descriptor.dependencies[1],
            Dependency::new(Coordinate::parse("junit:junit:4.13.2").unwrap(), Scope::TestImplementation)
        );

        let task = &descriptor.tasks[0];
        assert_eq!(task.kind, TaskKind::Custom);
        assert_eq!(task.task_type.as_deref(), Some("Jar"));
        assert_eq!(
            task.options.get("archiveClassifier"),
            Some(&Value::String("sources".to_string()))
        );
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut descriptor = Descriptor::from_toml_str(LIBRARY).unwrap();
        let mut test = Task::new("integrationTest", TaskKind::Custom, Some("Test".to_string()));
        test.options.insert("maxParallelForks".to_string(), Value::Integer(4));
        descriptor.tasks.push(test);

        let text = descriptor.to_toml_string().unwrap();
        assert!(text.contains("coordinate = \"junit:junit:4.13.2\""));
        assert_eq!(Descriptor::from_toml_str(&text).unwrap(), descriptor);
    }

    #[test]
    fn test_missing_coordinate_part_is_malformed() {
        let err = Descriptor::from_toml_str(
            "[[dependencies]]\ncoordinate = \"junit:junit\"\nscope = \"testImplementation\"\n",
        )
        .unwrap_err();

        let DescriptorError::MalformedDescriptor { diagnostics } = err else {
            panic!("expected MalformedDescriptor, got {:?}", err);
        };
        assert_eq!(diagnostics[0].code, "K5001");
        assert_eq!(diagnostics[0].line, 2);
        assert!(diagnostics[0].message.contains("missing version"));
    }

    #[test]
    fn test_unknown_scope_is_malformed() {
        let result = Descriptor::from_toml_str(
            "[[dependencies]]\ncoordinate = \"junit:junit:4.13.2\"\nscope = \"compileOnly\"\n",
        );
        assert!(matches!(result, Err(DescriptorError::MalformedDescriptor { .. })));
    }
}
