//! Deps command - list resolved dependencies

use super::Session;
use anyhow::Result;
use kiln_descriptor::{Classpath, ResolvedDependency};

pub fn run(session: &Session, classpath: Option<Classpath>) -> Result<()> {
    let loaded = session.load()?;
    let dependencies: Vec<&ResolvedDependency> = match classpath {
        Some(cp) => loaded.dependencies.classpath(cp),
        None => loaded.dependencies.iter().collect(),
    };

    if session.json {
        println!("{}", serde_json::to_string_pretty(&dependencies)?);
        return Ok(());
    }

    if dependencies.is_empty() {
        println!("No dependencies");
        return Ok(());
    }

    let width = dependencies
        .iter()
        .map(|d| d.scope.configuration_name().len())
        .max()
        .unwrap_or(0);
    for dep in dependencies {
        println!(
            "{:<width$}  {}  ({})",
            dep.scope.configuration_name(),
            dep.coordinate,
            dep.repository,
            width = width
        );
    }

    Ok(())
}
