//! Check command - load and validate a descriptor

use super::Session;
use crate::output;
use anyhow::Result;

/// Validate the descriptor and summarize what was loaded
pub fn run(session: &Session) -> Result<()> {
    let loaded = session.load()?;

    if session.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "file": session.file.display().to_string(),
                "valid": true,
                "plugins": loaded.descriptor.plugins.iter().map(|p| &p.id).collect::<Vec<_>>(),
                "tasks": loaded.tasks.len(),
                "dependencies": loaded.dependencies.len(),
                "diagnostics": output::diagnostics_json(&loaded.warnings),
            }))?
        );
    } else {
        println!(
            "{}: OK ({} tasks, {} dependencies, {} warning{})",
            session.file.display(),
            loaded.tasks.len(),
            loaded.dependencies.len(),
            loaded.warnings.len(),
            if loaded.warnings.len() == 1 { "" } else { "s" }
        );
    }

    Ok(())
}
