//! Export command - write the TOML form of a descriptor

use super::Session;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub fn run(session: &Session, output: Option<&Path>) -> Result<()> {
    let loaded = session.load()?;
    let toml = loaded
        .descriptor
        .to_toml_string()
        .context("Failed to serialize descriptor")?;

    match output {
        Some(path) => {
            fs::write(path, toml)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{}", toml),
    }

    Ok(())
}
