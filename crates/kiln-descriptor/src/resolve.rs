//! Dependency resolution
//!
//! Binds every declared dependency to a repository and computes which
//! dependencies are visible on each classpath. Nothing is downloaded.

use crate::model::{Coordinate, Dependency, Repository, Scope};
use crate::version::compare_versions;
use kiln_config::LoaderSettings;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A set of dependencies visible to one compilation, test or run step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classpath {
    /// What consumers of the library compile against
    Api,
    Compile,
    Runtime,
    TestCompile,
    TestRuntime,
}

impl Classpath {
    pub const ALL: [Classpath; 5] = [
        Classpath::Api,
        Classpath::Compile,
        Classpath::Runtime,
        Classpath::TestCompile,
        Classpath::TestRuntime,
    ];

    /// Scopes whose dependencies appear on this classpath
    pub fn scopes(&self) -> &'static [Scope] {
        match self {
            Classpath::Api => &[Scope::Api],
            Classpath::Compile | Classpath::Runtime => &[Scope::Api, Scope::Implementation],
            Classpath::TestCompile => &[Scope::Api, Scope::Implementation, Scope::TestImplementation],
            Classpath::TestRuntime => &[
                Scope::Api,
                Scope::Implementation,
                Scope::TestImplementation,
                Scope::TestRuntimeOnly,
            ],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Classpath::Api => "api",
            Classpath::Compile => "compile",
            Classpath::Runtime => "runtime",
            Classpath::TestCompile => "test-compile",
            Classpath::TestRuntime => "test-runtime",
        }
    }
}

impl fmt::Display for Classpath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Classpath {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|cp| cp.name() == s)
            .ok_or_else(|| {
                format!(
                    "unknown classpath '{}', expected one of api, compile, runtime, test-compile, test-runtime",
                    s
                )
            })
    }
}

/// A dependency bound to the repository it is fetched from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedDependency {
    pub coordinate: Coordinate,
    pub scope: Scope,
    /// Repository name
    pub repository: String,
    /// Repository URL after applying mirrors
    pub repository_url: String,
    /// Maven-layout URL of the jar
    pub artifact_url: String,
}

/// Resolved dependencies in declaration order
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencySet {
    dependencies: Vec<ResolvedDependency>,
}

impl DependencySet {
    /// Bind each dependency to the first repository
    ///
    /// Returns `None` when there are dependencies but no repository to bind
    /// them to.
    pub fn resolve(
        dependencies: &[Dependency],
        repositories: &[Repository],
        settings: &LoaderSettings,
    ) -> Option<Self> {
        if dependencies.is_empty() {
            return Some(Self::default());
        }
        let repository = repositories.first()?;
        let repository_url = settings.mirror_for(&repository.url).to_string();
        if repository_url != repository.url {
            debug!(from = %repository.url, to = %repository_url, "using repository mirror");
        }

        let dependencies = dependencies
            .iter()
            .map(|d| ResolvedDependency {
                coordinate: d.coordinate.clone(),
                scope: d.scope,
                repository: repository.name.clone(),
                artifact_url: artifact_url(&repository_url, &d.coordinate),
                repository_url: repository_url.clone(),
            })
            .collect();

        Some(Self { dependencies })
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResolvedDependency> {
        self.dependencies.iter()
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }

    pub fn in_scope(&self, scope: Scope) -> impl Iterator<Item = &ResolvedDependency> {
        self.dependencies.iter().filter(move |d| d.scope == scope)
    }

    /// Dependencies visible on a classpath, one version per module
    ///
    /// When a module appears with several versions the highest one wins.
    /// Modules keep the position of their first declaration.
    pub fn classpath(&self, classpath: Classpath) -> Vec<&ResolvedDependency> {
        let scopes = classpath.scopes();
        let mut chosen: Vec<&ResolvedDependency> = Vec::new();

        for dependency in self.dependencies.iter().filter(|d| scopes.contains(&d.scope)) {
            let existing = chosen.iter_mut().find(|c| {
                c.coordinate.group == dependency.coordinate.group
                    && c.coordinate.artifact == dependency.coordinate.artifact
            });
            match existing {
                Some(existing) => {
                    if compare_versions(&dependency.coordinate.version, &existing.coordinate.version)
                        == Ordering::Greater
                    {
                        *existing = dependency;
                    }
                }
                None => chosen.push(dependency),
            }
        }

        chosen
    }
}

impl<'a> IntoIterator for &'a DependencySet {
    type Item = &'a ResolvedDependency;
    type IntoIter = std::slice::Iter<'a, ResolvedDependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.dependencies.iter()
    }
}

/// `{repo}/{group as path}/{artifact}/{version}/{artifact}-{version}.jar`
fn artifact_url(repository_url: &str, coordinate: &Coordinate) -> String {
    format!(
        "{}/{}/{}/{}/{}-{}.jar",
        repository_url.trim_end_matches('/'),
        coordinate.group.replace('.', "/"),
        coordinate.artifact,
        coordinate.version,
        coordinate.artifact,
        coordinate.version
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn dep(coordinate: &str, scope: Scope) -> Dependency {
        Dependency::new(Coordinate::parse(coordinate).unwrap(), scope)
    }

    fn central() -> Vec<Repository> {
        vec![Repository::from_shorthand("mavenCentral").unwrap()]
    }

    #[test]
    fn test_artifact_url_layout() {
        let set = DependencySet::resolve(
            &[dep("com.google.guava:guava:30.1-jre", Scope::Implementation)],
            &central(),
            &LoaderSettings::default(),
        )
        .unwrap();

        let resolved = set.iter().next().unwrap();
        assert_eq!(resolved.repository, "MavenRepo");
        assert_eq!(
            resolved.artifact_url,
            "https://repo.maven.apache.org/maven2/com/google/guava/guava/30.1-jre/guava-30.1-jre.jar"
        );
    }

    #[test]
    fn test_mirror_rewrites_urls() {
        let mut settings = LoaderSettings::default();
        settings.mirrors.insert(
            Repository::MAVEN_CENTRAL_URL.to_string(),
            "https://nexus.internal/maven2".to_string(),
        );

        let set = DependencySet::resolve(
            &[dep("junit:junit:4.13.2", Scope::TestImplementation)],
            &central(),
            &settings,
        )
        .unwrap();

        let resolved = set.iter().next().unwrap();
        assert_eq!(resolved.repository_url, "https://nexus.internal/maven2");
        assert_eq!(
            resolved.artifact_url,
            "https://nexus.internal/maven2/junit/junit/4.13.2/junit-4.13.2.jar"
        );
    }

    #[test]
    fn test_no_repository() {
        let deps = [dep("junit:junit:4.13.2", Scope::TestImplementation)];
        assert!(DependencySet::resolve(&deps, &[], &LoaderSettings::default()).is_none());
        assert!(DependencySet::resolve(&[], &[], &LoaderSettings::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_classpath_visibility() {
        let set = DependencySet::resolve(
            &[
                dep("org.scala-lang:scala-library:2.13.5", Scope::Implementation),
                dep("org.apache.commons:commons-math3:3.6.1", Scope::Api),
                dep("junit:junit:4.13.2", Scope::TestImplementation),
                dep("org.junit.vintage:junit-vintage-engine:5.7.2", Scope::TestRuntimeOnly),
            ],
            &central(),
            &LoaderSettings::default(),
        )
        .unwrap();

        let artifacts = |cp: Classpath| -> Vec<String> {
            set.classpath(cp)
                .iter()
                .map(|d| d.coordinate.artifact.clone())
                .collect()
        };

        assert_eq!(artifacts(Classpath::Api), vec!["commons-math3"]);
        assert_eq!(artifacts(Classpath::Compile), vec!["scala-library", "commons-math3"]);
        assert_eq!(artifacts(Classpath::Runtime), artifacts(Classpath::Compile));
        assert_eq!(
            artifacts(Classpath::TestCompile),
            vec!["scala-library", "commons-math3", "junit"]
        );
        assert_eq!(
            artifacts(Classpath::TestRuntime),
            vec!["scala-library", "commons-math3", "junit", "junit-vintage-engine"]
        );
    }

    #[test]
    fn test_highest_version_wins() {
        let set = DependencySet::resolve(
            &[
                dep("com.google.guava:guava:30.1-jre", Scope::Implementation),
                dep("com.google.guava:guava:31.0-jre", Scope::TestImplementation),
            ],
            &central(),
            &LoaderSettings::default(),
        )
        .unwrap();

        assert_eq!(set.classpath(Classpath::Compile)[0].coordinate.version, "30.1-jre");
        let test = set.classpath(Classpath::TestCompile);
        assert_eq!(test.len(), 1);
        assert_eq!(test[0].coordinate.version, "31.0-jre");
    }

    #[test]
    fn test_classpath_from_str() {
        assert_eq!("test-runtime".parse::<Classpath>(), Ok(Classpath::TestRuntime));
        assert!("testRuntime".parse::<Classpath>().is_err());
    }
}
