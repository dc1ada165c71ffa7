//! Property tests over generated descriptors

use kiln_descriptor::{Descriptor, DescriptorError, DescriptorLoader, Scope};
use proptest::prelude::*;

fn scope() -> impl Strategy<Value = Scope> {
    prop::sample::select(Scope::ALL.to_vec())
}

fn name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,6}(\\.[a-z][a-z0-9]{0,6}){0,2}"
}

fn version() -> impl Strategy<Value = String> {
    "[0-9]{1,2}(\\.[0-9]{1,2}){0,2}(-(rc[0-9]|jre|SNAPSHOT))?"
}

fn declarations() -> impl Strategy<Value = Vec<(Scope, String, String, String)>> {
    prop::collection::vec((scope(), name(), name(), version()), 0..8)
}

fn render(declarations: &[(Scope, String, String, String)], indent: &str) -> String {
    let mut source = String::from("plugins {\n    `java-library`\n}\n\nrepositories {\n    mavenCentral()\n}\n\ndependencies {\n");
    for (scope, group, artifact, version) in declarations {
        source.push_str(&format!(
            "{}{}(\"{}:{}:{}\")\n",
            indent,
            scope.configuration_name(),
            group,
            artifact,
            version
        ));
    }
    source.push_str("}\n");
    source
}

proptest! {
    #[test]
    fn loading_is_idempotent(decls in declarations()) {
        let source = render(&decls, "    ");
        let loader = DescriptorLoader::new();
        let first = loader.load_str(&source).unwrap();
        let second = loader.load_str(&source).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn layout_does_not_change_the_model(decls in declarations(), indent in "[ \t]{0,8}") {
        let canonical = Descriptor::from_dsl_str(&render(&decls, "    ")).unwrap();
        let reindented = Descriptor::from_dsl_str(&render(&decls, &indent)).unwrap();
        prop_assert_eq!(canonical, reindented);
    }

    #[test]
    fn scopes_survive_loading(decls in declarations()) {
        let loaded = DescriptorLoader::new().load_str(&render(&decls, "    ")).unwrap();

        let mut expected = Vec::new();
        for (scope, group, artifact, version) in &decls {
            let entry = (*scope, format!("{}:{}:{}", group, artifact, version));
            if !expected.contains(&entry) {
                expected.push(entry);
            }
        }
        let actual: Vec<(Scope, String)> = loaded
            .descriptor
            .dependencies
            .iter()
            .map(|d| (d.scope, d.coordinate.to_string()))
            .collect();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn toml_form_preserves_the_model(decls in declarations()) {
        let descriptor = Descriptor::from_dsl_str(&render(&decls, "    ")).unwrap();
        let text = descriptor.to_toml_string().unwrap();
        prop_assert_eq!(Descriptor::from_toml_str(&text).unwrap(), descriptor);
    }

    #[test]
    fn dropping_the_version_is_malformed(
        decls in declarations(),
        group in name(),
        artifact in name(),
        scope in scope(),
    ) {
        let mut source = render(&decls, "    ");
        source.push_str(&format!(
            "dependencies {{\n    {}(\"{}:{}\")\n}}\n",
            scope.configuration_name(),
            group,
            artifact
        ));

        let result = DescriptorLoader::new().load_str(&source);
        let is_malformed = matches!(result, Err(DescriptorError::MalformedDescriptor { .. }));
        prop_assert!(is_malformed);
    }
}
