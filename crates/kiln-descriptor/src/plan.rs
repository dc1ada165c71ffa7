//! Execution plan computation for descriptor tasks

use crate::model::{Descriptor, Task, TaskKind};
use crate::resolve::Classpath;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("Circular task dependency detected: {0}")]
    CircularDependency(String),

    #[error("Task '{0}' not found")]
    TaskNotFound(String),
}

pub type PlanResult<T> = Result<T, PlanError>;

/// One task in an execution plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedStep {
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    pub kind: TaskKind,
    /// Scheduled tasks this one waits for
    pub depends_on: Vec<String>,
    /// Classpath the task consumes, if it compiles, documents, tests or runs code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classpath: Option<Classpath>,
}

/// Ordered tasks for a set of goals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionPlan {
    /// Requested tasks; empty for a plan of every task
    pub goals: Vec<String>,
    /// Tasks in execution order
    pub steps: Vec<PlannedStep>,
    /// Groups of tasks whose prerequisites are all in earlier groups
    pub stages: Vec<Vec<String>>,
}

impl ExecutionPlan {
    /// Plan the goals and everything they depend on
    ///
    /// Tasks are ordered topologically over `dependsOn` and `mustRunAfter`
    /// edges; ties go to the task registered first.
    pub fn for_goals<S: AsRef<str>>(descriptor: &Descriptor, goals: &[S]) -> PlanResult<Self> {
        let graph = TaskGraph::new(&descriptor.tasks);
        let goal_indices = goals
            .iter()
            .map(|g| graph.lookup(g.as_ref()))
            .collect::<PlanResult<Vec<_>>>()?;

        let selected = graph.closure(&goal_indices)?;
        let mut plan = graph.plan(&selected)?;
        plan.goals = goals.iter().map(|g| g.as_ref().to_string()).collect();
        Ok(plan)
    }

    /// Plan every task of the descriptor
    pub fn full(descriptor: &Descriptor) -> PlanResult<Self> {
        let graph = TaskGraph::new(&descriptor.tasks);
        let all: Vec<usize> = (0..descriptor.tasks.len()).collect();
        let selected = graph.closure(&all)?;
        graph.plan(&selected)
    }

    pub fn task_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Position of a task in the plan
    pub fn position(&self, name: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.name == name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Numbered task list, one task per line
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, step) in self.steps.iter().enumerate() {
            let _ = write!(out, "{:>2}. {}", i + 1, step.name);
            if let Some(classpath) = step.classpath {
                let _ = write!(out, " [{}]", classpath);
            }
            out.push('\n');
        }
        out
    }
}

/// Cycle through `dependsOn` and `mustRunAfter` edges, e.g. `[a, b, a]`
pub fn find_cycle(tasks: &[Task]) -> Option<Vec<String>> {
    let graph = TaskGraph::new(tasks);
    let all: BTreeSet<usize> = (0..tasks.len()).collect();
    graph.find_cycle(&all)
}

/// Classpath consumed by a task, derived from its type
fn classpath_for(task: &Task) -> Option<Classpath> {
    let is_test = task.name.contains("Test") || task.name.starts_with("test");
    match task.task_type.as_deref()? {
        "Test" => Some(Classpath::TestRuntime),
        "JavaCompile" | "ScalaCompile" | "GroovyCompile" | "KotlinCompile" | "Javadoc"
        | "ScalaDoc" => Some(if is_test {
            Classpath::TestCompile
        } else {
            Classpath::Compile
        }),
        "JavaExec" => Some(Classpath::Runtime),
        _ => None,
    }
}

/// Task graph indexed by registration order
struct TaskGraph<'a> {
    tasks: &'a [Task],
    index: HashMap<&'a str, usize>,
}

impl<'a> TaskGraph<'a> {
    fn new(tasks: &'a [Task]) -> Self {
        let mut index = HashMap::new();
        for (i, task) in tasks.iter().enumerate() {
            index.entry(task.name.as_str()).or_insert(i);
        }
        Self { tasks, index }
    }

    fn lookup(&self, name: &str) -> PlanResult<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| PlanError::TaskNotFound(name.to_string()))
    }

    /// Goals plus everything they transitively depend on
    fn closure(&self, goals: &[usize]) -> PlanResult<BTreeSet<usize>> {
        let mut selected = BTreeSet::new();
        let mut stack = goals.to_vec();

        while let Some(i) = stack.pop() {
            if !selected.insert(i) {
                continue;
            }
            for dependency in &self.tasks[i].depends_on {
                stack.push(self.lookup(dependency)?);
            }
        }

        Ok(selected)
    }

    /// Selected tasks that must finish before task `i`
    ///
    /// `mustRunAfter` only orders tasks that are both scheduled.
    fn prerequisites(&self, i: usize, selected: &BTreeSet<usize>) -> Vec<usize> {
        let task = &self.tasks[i];
        let mut prerequisites = Vec::new();
        for name in task.depends_on.iter().chain(&task.must_run_after) {
            if let Some(&j) = self.index.get(name.as_str()) {
                if selected.contains(&j) && !prerequisites.contains(&j) {
                    prerequisites.push(j);
                }
            }
        }
        prerequisites
    }

    /// Kahn's algorithm; the ready set is ordered by registration index
    fn plan(&self, selected: &BTreeSet<usize>) -> PlanResult<ExecutionPlan> {
        let mut in_degree: HashMap<usize, usize> = HashMap::new();
        let mut dependents: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut prerequisites: HashMap<usize, Vec<usize>> = HashMap::new();

        for &i in selected {
            let before = self.prerequisites(i, selected);
            in_degree.insert(i, before.len());
            for &p in &before {
                dependents.entry(p).or_default().push(i);
            }
            prerequisites.insert(i, before);
        }

        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(i, _)| *i)
            .collect();
        let mut order = Vec::with_capacity(selected.len());

        while let Some(i) = ready.pop_first() {
            order.push(i);
            for &dependent in dependents.get(&i).map(Vec::as_slice).unwrap_or_default() {
                if let Some(degree) = in_degree.get_mut(&dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(dependent);
                    }
                }
            }
        }

        if order.len() != selected.len() {
            let cycle = self.find_cycle(selected).unwrap_or_default();
            return Err(PlanError::CircularDependency(cycle.join(" -> ")));
        }

        // Stage = length of the longest prerequisite chain
        let mut level: HashMap<usize, usize> = HashMap::new();
        let mut stages: Vec<Vec<usize>> = Vec::new();
        for &i in &order {
            let stage = prerequisites[&i]
                .iter()
                .map(|p| level[p] + 1)
                .max()
                .unwrap_or(0);
            level.insert(i, stage);
            if stages.len() <= stage {
                stages.resize_with(stage + 1, Vec::new);
            }
            stages[stage].push(i);
        }

        let name = |i: &usize| self.tasks[*i].name.clone();
        let steps = order
            .iter()
            .map(|&i| {
                let task = &self.tasks[i];
                PlannedStep {
                    name: task.name.clone(),
                    task_type: task.task_type.clone(),
                    kind: task.kind,
                    depends_on: prerequisites[&i].iter().map(name).collect(),
                    classpath: classpath_for(task),
                }
            })
            .collect();
        let stages = stages
            .into_iter()
            .map(|mut stage| {
                stage.sort_unstable();
                stage.iter().map(name).collect()
            })
            .collect();

        Ok(ExecutionPlan {
            goals: Vec::new(),
            steps,
            stages,
        })
    }

    fn find_cycle(&self, selected: &BTreeSet<usize>) -> Option<Vec<String>> {
        let mut state = HashMap::new();
        let mut path = Vec::new();
        selected
            .iter()
            .find_map(|&start| self.visit(start, selected, &mut state, &mut path))
    }

    fn visit(
        &self,
        i: usize,
        selected: &BTreeSet<usize>,
        state: &mut HashMap<usize, Visit>,
        path: &mut Vec<usize>,
    ) -> Option<Vec<String>> {
        match state.get(&i) {
            Some(Visit::Done) => return None,
            Some(Visit::InProgress) => {
                let start = path.iter().position(|&p| p == i)?;
                let mut cycle: Vec<String> = path[start..]
                    .iter()
                    .map(|&p| self.tasks[p].name.clone())
                    .collect();
                cycle.push(self.tasks[i].name.clone());
                return Some(cycle);
            }
            None => {}
        }

        state.insert(i, Visit::InProgress);
        path.push(i);
        for p in self.prerequisites(i, selected) {
            if let Some(cycle) = self.visit(p, selected, state, path) {
                return Some(cycle);
            }
        }
        path.pop();
        state.insert(i, Visit::Done);
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::register_builtin_tasks;
    use pretty_assertions::assert_eq;

    fn descriptor(tasks: &[(&str, &[&str])]) -> Descriptor {
        let mut descriptor = Descriptor::default();
        for (name, depends_on) in tasks {
            let mut task = Task::new(*name, TaskKind::Custom, None);
            for dep in depends_on.iter() {
                task.add_dependency(*dep);
            }
            descriptor.tasks.push(task);
        }
        descriptor
    }

    #[test]
    fn test_empty_plan() {
        let plan = ExecutionPlan::full(&Descriptor::default()).unwrap();
        assert!(plan.is_empty());
        assert!(plan.stages.is_empty());
    }

    #[test]
    fn test_linear() {
        let d = descriptor(&[("package", &["compile"]), ("compile", &["generate"]), ("generate", &[])]);
        let plan = ExecutionPlan::for_goals(&d, &["package"]).unwrap();

        assert_eq!(plan.task_names(), vec!["generate", "compile", "package"]);
        assert_eq!(plan.goals, vec!["package"]);
        assert_eq!(plan.stages.len(), 3);
    }

    #[test]
    fn test_diamond_ties_follow_registration_order() {
        let d = descriptor(&[
            ("root", &["right", "left"]),
            ("right", &["bottom"]),
            ("left", &["bottom"]),
            ("bottom", &[]),
        ]);
        let plan = ExecutionPlan::full(&d).unwrap();

        assert_eq!(plan.task_names(), vec!["bottom", "right", "left", "root"]);
        assert_eq!(
            plan.stages,
            vec![vec!["bottom"], vec!["right", "left"], vec!["root"]]
        );
    }

    #[test]
    fn test_goal_closure_excludes_unrelated_tasks() {
        let d = descriptor(&[("a", &[]), ("b", &["a"]), ("c", &[])]);
        let plan = ExecutionPlan::for_goals(&d, &["b"]).unwrap();
        assert_eq!(plan.task_names(), vec!["a", "b"]);
        assert_eq!(plan.position("c"), None);
    }

    #[test]
    fn test_must_run_after_only_between_scheduled_tasks() {
        let mut d = descriptor(&[("lint", &[]), ("test", &[]), ("check", &["lint", "test"])]);
        d.tasks[0].add_must_run_after("test");

        let plan = ExecutionPlan::for_goals(&d, &["check"]).unwrap();
        assert_eq!(plan.task_names(), vec!["test", "lint", "check"]);

        let plan = ExecutionPlan::for_goals(&d, &["lint"]).unwrap();
        assert_eq!(plan.task_names(), vec!["lint"]);
    }

    #[test]
    fn test_errors() {
        let d = descriptor(&[("a", &["b"]), ("b", &["c"]), ("c", &["a"]), ("d", &["ghost"])]);

        assert_eq!(
            ExecutionPlan::for_goals(&d, &["a"]),
            Err(PlanError::CircularDependency("a -> b -> c -> a".to_string()))
        );
        assert_eq!(
            ExecutionPlan::for_goals(&d, &["nope"]),
            Err(PlanError::TaskNotFound("nope".to_string()))
        );
        assert_eq!(
            ExecutionPlan::for_goals(&d, &["d"]),
            Err(PlanError::TaskNotFound("ghost".to_string()))
        );
    }

    #[test]
    fn test_java_build_plan() {
        let mut d = Descriptor::default();
        register_builtin_tasks("java", &mut d.tasks);

        let plan = ExecutionPlan::for_goals(&d, &["build"]).unwrap();
        insta::assert_snapshot!(plan.render(), @r###"
         1. compileJava [compile]
         2. processResources
         3. classes
         4. jar
         5. compileTestJava [test-compile]
         6. processTestResources
         7. testClasses
         8. test [test-runtime]
         9. check
        10. assemble
        11. build
        "###);
    }
}
