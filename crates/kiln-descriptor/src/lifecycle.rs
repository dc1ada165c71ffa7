//! Built-in tasks registered by plugins

use crate::model::{Task, TaskKind};

/// Built-in task template: (name, type, group, depends-on)
type TaskTemplate = (&'static str, &'static str, Option<&'static str>, &'static [&'static str]);

const JAVA_TASKS: &[TaskTemplate] = &[
    ("clean", "Delete", Some("build"), &[]),
    ("compileJava", "JavaCompile", None, &[]),
    ("processResources", "ProcessResources", None, &[]),
    ("classes", "Lifecycle", Some("build"), &["compileJava", "processResources"]),
    ("jar", "Jar", Some("build"), &["classes"]),
    ("javadoc", "Javadoc", Some("documentation"), &["classes"]),
    ("compileTestJava", "JavaCompile", None, &["classes"]),
    ("processTestResources", "ProcessResources", None, &[]),
    ("testClasses", "Lifecycle", Some("build"), &["compileTestJava", "processTestResources"]),
    ("test", "Test", Some("verification"), &["classes", "testClasses"]),
    ("check", "Lifecycle", Some("verification"), &["test"]),
    ("assemble", "Lifecycle", Some("build"), &["jar"]),
    ("build", "Lifecycle", Some("build"), &["assemble", "check"]),
];

const SCALA_TASKS: &[TaskTemplate] = &[
    ("compileScala", "ScalaCompile", None, &["compileJava"]),
    ("compileTestScala", "ScalaCompile", None, &["classes", "compileTestJava"]),
    ("scaladoc", "ScalaDoc", Some("documentation"), &["classes"]),
];

const APPLICATION_TASKS: &[TaskTemplate] = &[
    ("run", "JavaExec", Some("application"), &["classes"]),
    ("startScripts", "CreateStartScripts", Some("distribution"), &["jar"]),
    ("installDist", "Sync", Some("distribution"), &["jar", "startScripts"]),
    ("distZip", "Zip", Some("distribution"), &["jar", "startScripts"]),
];

/// Extra edges a plugin adds to tasks registered by another plugin
const SCALA_EDGES: &[(&str, &str)] = &[("classes", "compileScala"), ("testClasses", "compileTestScala")];
const APPLICATION_EDGES: &[(&str, &str)] = &[("assemble", "distZip")];

/// Plugins that provide the dependency configurations
const CONFIGURATION_PLUGINS: &[&str] = &["java", "java-library", "scala", "application"];

/// Plugin ids this plugin applies implicitly
pub fn implied_plugins(id: &str) -> &'static [&'static str] {
    match id {
        "java-library" | "scala" | "application" => &["java"],
        _ => &[],
    }
}

/// Whether the plugin provides `implementation`, `api`, ... configurations
pub fn provides_configurations(id: &str) -> bool {
    CONFIGURATION_PLUGINS.contains(&id)
}

/// Whether registering built-in tasks is known for this plugin
pub fn is_lifecycle_plugin(id: &str) -> bool {
    matches!(id, "java" | "java-library" | "scala" | "application")
}

/// Add the built-in tasks of a plugin, skipping names already registered
///
/// Returns the names of the tasks that were added.
pub fn register_builtin_tasks(id: &str, tasks: &mut Vec<Task>) -> Vec<String> {
    let mut added = Vec::new();
    for implied in implied_plugins(id) {
        added.extend(register_builtin_tasks(implied, tasks));
    }

    let (templates, edges): (&[TaskTemplate], &[(&str, &str)]) = match id {
        "java" => (JAVA_TASKS, &[]),
        "scala" => (SCALA_TASKS, SCALA_EDGES),
        "application" => (APPLICATION_TASKS, APPLICATION_EDGES),
        _ => (&[], &[]),
    };

    for (name, task_type, group, depends_on) in templates {
        if tasks.iter().any(|t| t.name == *name) {
            continue;
        }
        let mut task = Task::new(*name, TaskKind::Builtin, Some(task_type.to_string()));
        task.group = group.map(str::to_string);
        for dep in depends_on.iter() {
            task.add_dependency(*dep);
        }
        tasks.push(task);
        added.push(name.to_string());
    }

    for (task_name, dependency) in edges {
        if let Some(task) = tasks.iter_mut().find(|t| t.name == *task_name) {
            task.add_dependency(*dependency);
        }
    }

    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_java_library_registers_java_lifecycle() {
        let mut tasks = Vec::new();
        let added = register_builtin_tasks("java-library", &mut tasks);

        assert_eq!(added.len(), JAVA_TASKS.len());
        assert_eq!(names(&tasks)[0], "clean");
        let build = tasks.iter().find(|t| t.name == "build").unwrap();
        assert_eq!(build.depends_on, vec!["assemble", "check"]);
        let test = tasks.iter().find(|t| t.name == "test").unwrap();
        assert!(test.test.is_some());
    }

    #[test]
    fn test_scala_wires_into_classes() {
        let mut tasks = Vec::new();
        register_builtin_tasks("scala", &mut tasks);

        assert!(names(&tasks).contains(&"compileScala"));
        let classes = tasks.iter().find(|t| t.name == "classes").unwrap();
        assert_eq!(
            classes.depends_on,
            vec!["compileJava", "processResources", "compileScala"]
        );
    }

    #[test]
    fn test_registration_is_idempotent() {
        let mut tasks = Vec::new();
        register_builtin_tasks("java", &mut tasks);
        let count = tasks.len();
        let added = register_builtin_tasks("java-library", &mut tasks);

        assert!(added.is_empty());
        assert_eq!(tasks.len(), count);
    }

    #[test]
    fn test_unknown_plugin_registers_nothing() {
        let mut tasks = Vec::new();
        assert!(register_builtin_tasks("org.jetbrains.kotlin.jvm", &mut tasks).is_empty());
        assert!(!provides_configurations("maven-publish"));
        assert!(provides_configurations("scala"));
    }
}
