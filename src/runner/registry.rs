//! Task registry
//!
//! Tasks are registered once at startup under unique names. A registry entry
//! is either an action (a function of the task context) or a composite plan
//! made of steps that name other entries.

use crate::config::AssetCategory;
use crate::error::{ConfigError, ConfigResult, ExecutionResult};
use crate::runner::context::{Mode, TaskContext};
use crate::runner::plan::Step;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// What a task reports back to the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Work finished
    Done,

    /// Switch the environment mode for all following steps
    SetMode(Mode),
}

/// A registered unit of work
pub type Action = Arc<dyn Fn(&TaskContext) -> ExecutionResult<Outcome> + Send + Sync>;

/// Body of a registry entry
#[derive(Clone)]
pub enum TaskKind {
    Action(Action),
    Plan(Vec<Step>),
}

/// A registry entry
#[derive(Clone)]
pub struct TaskDef {
    /// Unique task name
    pub name: String,

    /// One-line description shown by `--list`
    pub usage: Option<String>,

    /// Manifest categories the action reads
    pub consumes: Vec<AssetCategory>,

    /// Hidden from the task listing
    pub private: bool,

    /// Action or composite plan
    pub kind: TaskKind,
}

impl TaskDef {
    /// Define an action task
    pub fn action<F>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(&TaskContext) -> ExecutionResult<Outcome> + Send + Sync + 'static,
    {
        TaskDef {
            name: name.into(),
            usage: None,
            consumes: Vec::new(),
            private: false,
            kind: TaskKind::Action(Arc::new(action)),
        }
    }

    /// Define a composite plan
    pub fn plan(name: impl Into<String>, steps: Vec<Step>) -> Self {
        TaskDef {
            name: name.into(),
            usage: None,
            consumes: Vec::new(),
            private: false,
            kind: TaskKind::Plan(steps),
        }
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = Some(usage.into());
        self
    }

    pub fn consumes(mut self, categories: &[AssetCategory]) -> Self {
        self.consumes = categories.to_vec();
        self
    }

    pub fn private(mut self) -> Self {
        self.private = true;
        self
    }

    pub fn is_plan(&self) -> bool {
        matches!(self.kind, TaskKind::Plan(_))
    }
}

impl fmt::Debug for TaskDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            TaskKind::Action(_) => "action".to_string(),
            TaskKind::Plan(steps) => format!("plan({} steps)", steps.len()),
        };
        f.debug_struct("TaskDef")
            .field("name", &self.name)
            .field("kind", &kind)
            .field("consumes", &self.consumes)
            .field("private", &self.private)
            .finish()
    }
}

/// Registry of named tasks and plans
#[derive(Default, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<String, TaskDef>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        TaskRegistry {
            tasks: BTreeMap::new(),
        }
    }

    /// Register an action under a unique name
    pub fn register<F>(&mut self, name: impl Into<String>, action: F) -> ConfigResult<()>
    where
        F: Fn(&TaskContext) -> ExecutionResult<Outcome> + Send + Sync + 'static,
    {
        self.insert(TaskDef::action(name, action))
    }

    /// Register a composite plan under a unique name
    pub fn register_plan(&mut self, name: impl Into<String>, steps: Vec<Step>) -> ConfigResult<()> {
        self.insert(TaskDef::plan(name, steps))
    }

    /// Insert a fully described entry; names must be unique
    pub fn insert(&mut self, def: TaskDef) -> ConfigResult<()> {
        if self.tasks.contains_key(&def.name) {
            return Err(ConfigError::DuplicateTask(def.name));
        }
        self.tasks.insert(def.name.clone(), def);
        Ok(())
    }

    /// Replace a plan (or add a new one); actions cannot be shadowed by plans
    pub fn define_plan(&mut self, name: &str, steps: Vec<Step>) -> ConfigResult<()> {
        match self.tasks.get_mut(name) {
            Some(def) if def.is_plan() => {
                def.kind = TaskKind::Plan(steps);
                Ok(())
            }
            Some(_) => Err(ConfigError::DuplicateTask(name.to_string())),
            None => self.register_plan(name, steps),
        }
    }

    /// Look up an entry by name
    pub fn resolve(&self, name: &str) -> ConfigResult<&TaskDef> {
        self.tasks
            .get(name)
            .ok_or_else(|| ConfigError::TaskNotFound(name.to_string()))
    }

    /// Look up an action; plans are rejected
    pub fn action(&self, name: &str) -> ConfigResult<Action> {
        match &self.resolve(name)?.kind {
            TaskKind::Action(action) => Ok(action.clone()),
            TaskKind::Plan(_) => Err(ConfigError::Invalid(format!(
                "'{}' is a plan, expected a task",
                name
            ))),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// All entries, sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &TaskDef> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
