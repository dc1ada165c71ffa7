//! Plan command - ordered task list for a set of goals

use super::Session;
use anyhow::{Context, Result};
use kiln_descriptor::{Descriptor, ExecutionPlan};

/// Goal used when none is given and the descriptor defines it
const DEFAULT_GOAL: &str = "build";

pub fn run(session: &Session, goals: &[String]) -> Result<()> {
    let loaded = session.load()?;
    let plan = plan_for(&loaded.descriptor, goals, &loaded.plan)?;

    if session.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    if plan.goals.is_empty() {
        println!("All tasks:");
    } else {
        println!("Tasks for {}:", plan.goals.join(", "));
    }
    print!("{}", plan.render());

    println!();
    println!("Stages:");
    for (i, stage) in plan.stages.iter().enumerate() {
        println!("{:>2}. {}", i + 1, stage.join(", "));
    }

    Ok(())
}

/// Plan for explicit goals, the default goal, or every task
fn plan_for(descriptor: &Descriptor, goals: &[String], full: &ExecutionPlan) -> Result<ExecutionPlan> {
    if !goals.is_empty() {
        return ExecutionPlan::for_goals(descriptor, goals)
            .with_context(|| format!("Cannot plan {}", goals.join(", ")));
    }

    if descriptor.has_task(DEFAULT_GOAL) {
        ExecutionPlan::for_goals(descriptor, &[DEFAULT_GOAL])
            .with_context(|| format!("Cannot plan {}", DEFAULT_GOAL))
    } else {
        Ok(full.clone())
    }
}
