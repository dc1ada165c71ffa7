//! Kiln Build Descriptor Loader
//!
//! Loads a build descriptor (a Gradle Kotlin-DSL script or its TOML form)
//! into an immutable model, validates it, and produces:
//! - an ordered task list (the execution plan)
//! - a resolved dependency set with per-classpath visibility
//!
//! # Example
//!
//! ```
//! use kiln_descriptor::DescriptorLoader;
//!
//! let loaded = DescriptorLoader::new()
//!     .load_str(
//!         r#"
//! plugins { `java-library` }
//! repositories { mavenCentral() }
//! dependencies { api("org.apache.commons:commons-math3:3.6.1") }
//! "#,
//!     )
//!     .unwrap();
//!
//! assert!(loaded.tasks.iter().any(|t| t == "jar"));
//! assert_eq!(loaded.dependencies.len(), 1);
//! ```

pub mod codes;
mod interpret;
pub mod lifecycle;
pub mod loader;
pub mod manifest;
pub mod model;
pub mod plan;
pub mod resolve;
pub mod validator;
pub mod version;

use kiln_syntax::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

pub use loader::{DescriptorLoader, LoadedDescriptor};
pub use model::{
    Coordinate, CoordinateError, Dependency, Descriptor, Plugin, ProjectInfo, Repository, Scope,
    Task, TaskKind, TestLogEvent, TestRunner, TestSettings, Value,
};
pub use plan::{ExecutionPlan, PlanError, PlannedStep};
pub use resolve::{Classpath, DependencySet, ResolvedDependency};
pub use validator::{ValidationError, Validator};

/// Descriptor loading errors
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("Malformed descriptor: {}", summarize(.diagnostics))]
    MalformedDescriptor { diagnostics: Vec<Diagnostic> },

    #[error("Failed to read descriptor {}: {}", .path.display(), .error)]
    Read {
        path: PathBuf,
        #[source]
        error: std::io::Error,
    },

    #[error("Failed to serialize descriptor: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl DescriptorError {
    /// Diagnostics explaining a malformed descriptor
    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            DescriptorError::MalformedDescriptor { diagnostics } => diagnostics,
            _ => &[],
        }
    }
}

fn summarize(diagnostics: &[Diagnostic]) -> String {
    let mut errors = diagnostics.iter().filter(|d| d.is_error());
    match (errors.next(), errors.count()) {
        (Some(first), 0) => first.message.clone(),
        (Some(first), more) => format!("{} (and {} more)", first.message, more),
        (None, _) => "no details".to_string(),
    }
}

/// Result type for descriptor operations
pub type DescriptorResult<T> = Result<T, DescriptorError>;
