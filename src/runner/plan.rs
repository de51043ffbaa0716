//! Plan resolution
//!
//! A plan is written as a list of steps, each naming a task or a parallel
//! group of tasks. Before anything runs, names are looked up in the registry
//! and turned into a tree of resolved units. Unknown names, cycles between
//! plans and empty manifest categories are reported here, never mid-run.

use crate::config::{AssetManifest, PlanStep};
use crate::error::{ConfigError, ConfigResult};
use crate::runner::registry::{Action, TaskKind, TaskRegistry};
use std::fmt;

/// An unresolved plan step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Runs alone
    Sequential(String),

    /// All members start together; the step ends when every member ended
    Parallel(Vec<String>),
}

impl Step {
    pub fn names(&self) -> &[String] {
        match self {
            Step::Sequential(name) => std::slice::from_ref(name),
            Step::Parallel(names) => names,
        }
    }
}

impl From<PlanStep> for Step {
    fn from(step: PlanStep) -> Self {
        match step {
            PlanStep::Single(name) => Step::Sequential(name),
            PlanStep::Group(names) => Step::Parallel(names),
        }
    }
}

/// Shorthand for a sequential step
pub fn seq(name: &str) -> Step {
    Step::Sequential(name.to_string())
}

/// Shorthand for a parallel group
pub fn par(names: &[&str]) -> Step {
    Step::Parallel(names.iter().map(|n| n.to_string()).collect())
}

/// A resolved plan, ready for the sequencer
#[derive(Clone)]
pub struct Plan {
    pub name: String,
    pub steps: Vec<ResolvedStep>,
}

/// A resolved step
#[derive(Clone)]
pub enum ResolvedStep {
    Sequential(Unit),
    Parallel(Vec<Unit>),
}

/// Something a step runs: an action or a nested plan
#[derive(Clone)]
pub enum Unit {
    Task { name: String, action: Action },
    Plan(Plan),
}

impl Unit {
    pub fn name(&self) -> &str {
        match self {
            Unit::Task { name, .. } => name,
            Unit::Plan(plan) => &plan.name,
        }
    }
}

impl Plan {
    /// Resolve a registry entry by name
    ///
    /// A plain task resolves to a one-step plan so that everything the CLI
    /// selects runs through the same sequencer path.
    pub fn resolve(
        name: &str,
        registry: &TaskRegistry,
        manifest: &AssetManifest,
    ) -> ConfigResult<Plan> {
        let mut stack = Vec::new();
        match resolve_unit(name, registry, manifest, &mut stack)? {
            Unit::Plan(plan) => Ok(plan),
            unit @ Unit::Task { .. } => Ok(Plan {
                name: name.to_string(),
                steps: vec![ResolvedStep::Sequential(unit)],
            }),
        }
    }

    /// Action names in execution order, nested plans flattened
    pub fn task_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        for step in &self.steps {
            match step {
                ResolvedStep::Sequential(unit) => collect_names(unit, &mut names),
                ResolvedStep::Parallel(units) => {
                    for unit in units {
                        collect_names(unit, &mut names);
                    }
                }
            }
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

fn collect_names(unit: &Unit, names: &mut Vec<String>) {
    match unit {
        Unit::Task { name, .. } => names.push(name.clone()),
        Unit::Plan(plan) => names.extend(plan.task_names()),
    }
}

/// Renders `env:dev -> lint -> [uglify, cssmin]`
impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .steps
            .iter()
            .map(|step| match step {
                ResolvedStep::Sequential(unit) => unit.name().to_string(),
                ResolvedStep::Parallel(units) => format!(
                    "[{}]",
                    units.iter().map(|u| u.name()).collect::<Vec<_>>().join(", ")
                ),
            })
            .collect();
        f.write_str(&rendered.join(" -> "))
    }
}

impl fmt::Debug for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Plan({}: {})", self.name, self)
    }
}

fn resolve_unit(
    name: &str,
    registry: &TaskRegistry,
    manifest: &AssetManifest,
    stack: &mut Vec<String>,
) -> ConfigResult<Unit> {
    if stack.iter().any(|s| s == name) {
        stack.push(name.to_string());
        return Err(ConfigError::CircularDependency(stack.join(" -> ")));
    }

    let def = registry.resolve(name)?;

    for category in &def.consumes {
        if manifest.patterns(*category).is_empty() {
            return Err(ConfigError::EmptyCategory {
                category: category.to_string(),
                task: name.to_string(),
            });
        }
    }

    match &def.kind {
        TaskKind::Action(action) => Ok(Unit::Task {
            name: name.to_string(),
            action: action.clone(),
        }),
        TaskKind::Plan(steps) => {
            stack.push(name.to_string());
            let steps = resolve_steps(steps, registry, manifest, stack)?;
            stack.pop();
            Ok(Unit::Plan(Plan {
                name: name.to_string(),
                steps,
            }))
        }
    }
}

fn resolve_steps(
    steps: &[Step],
    registry: &TaskRegistry,
    manifest: &AssetManifest,
    stack: &mut Vec<String>,
) -> ConfigResult<Vec<ResolvedStep>> {
    let mut resolved = Vec::with_capacity(steps.len());
    for step in steps {
        match step {
            Step::Sequential(name) => {
                resolved.push(ResolvedStep::Sequential(resolve_unit(
                    name, registry, manifest, stack,
                )?));
            }
            Step::Parallel(names) => {
                let units = names
                    .iter()
                    .map(|name| resolve_unit(name, registry, manifest, stack))
                    .collect::<ConfigResult<Vec<_>>>()?;
                resolved.push(ResolvedStep::Parallel(units));
            }
        }
    }
    Ok(resolved)
}
