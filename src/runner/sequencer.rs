//! Plan execution
//!
//! Steps run strictly in order. The members of a parallel step are each
//! started on a scoped thread before any of them is joined, and the step
//! ends once all of them ended. The first failing step aborts the plan;
//! siblings already running in the same parallel step are left to finish
//! and their own errors are only logged.
//!
//! The environment mode flows through the run as a value: a task that
//! returns [`Outcome::SetMode`] changes the mode seen by later steps.

use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::context::{Mode, TaskContext};
use crate::runner::plan::{Plan, ResolvedStep, Unit};
use crate::runner::registry::Outcome;
use std::thread;
use std::time::Instant;

/// Runs resolved plans
pub struct Sequencer {
    ctx: TaskContext,
}

impl Sequencer {
    pub fn new(ctx: TaskContext) -> Self {
        Sequencer { ctx }
    }

    /// Run a plan to completion or to its first failure
    pub fn run(&self, plan: &Plan) -> ExecutionResult<()> {
        self.run_plan(plan, self.ctx.mode).map(|_| ())
    }

    /// Run a plan and hand the outcome to `done`, which is called exactly once
    pub fn run_with<F>(&self, plan: &Plan, done: F)
    where
        F: FnOnce(ExecutionResult<()>),
    {
        done(self.run(plan));
    }

    /// Run a plan starting from `mode`, returning the mode it ended with
    pub fn run_plan(&self, plan: &Plan, mode: Option<Mode>) -> ExecutionResult<Option<Mode>> {
        let mut mode = mode;
        for step in &plan.steps {
            mode = match step {
                ResolvedStep::Sequential(unit) => self.run_unit(unit, mode)?,
                ResolvedStep::Parallel(units) => self.run_parallel(units, mode)?,
            };
        }
        Ok(mode)
    }

    fn run_parallel(&self, units: &[Unit], mode: Option<Mode>) -> ExecutionResult<Option<Mode>> {
        let results: Vec<ExecutionResult<Option<Mode>>> = thread::scope(|scope| {
            let handles: Vec<_> = units
                .iter()
                .map(|unit| (unit.name(), scope.spawn(move || self.run_unit(unit, mode))))
                .collect();

            handles
                .into_iter()
                .map(|(name, handle)| {
                    handle.join().unwrap_or_else(|panic| {
                        Err(ExecutionError::TaskFailed {
                            task: name.to_string(),
                            source: Box::new(ExecutionError::Panicked(panic_message(&*panic))),
                        })
                    })
                })
                .collect()
        });

        let mut next = mode;
        let mut first_error = None;
        for result in results {
            match result {
                Ok(member_mode) if member_mode != mode => next = member_mode,
                Ok(_) => {}
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => self.ctx.print_debug(&format!("also failed: {}", e)),
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(next),
        }
    }

    fn run_unit(&self, unit: &Unit, mode: Option<Mode>) -> ExecutionResult<Option<Mode>> {
        let name = unit.name();
        let started = Instant::now();
        self.ctx.print_task_start(name);

        let result = match unit {
            Unit::Task { action, .. } => {
                let ctx = self.ctx.for_task(name, mode);
                match action(&ctx) {
                    Ok(Outcome::Done) => Ok(mode),
                    Ok(Outcome::SetMode(next)) => {
                        ctx.print_debug(&format!("mode set to {}", next));
                        Ok(Some(next))
                    }
                    Err(e) => {
                        self.ctx.print_task_failed(name, &e);
                        Err(ExecutionError::TaskFailed {
                            task: name.to_string(),
                            source: Box::new(e),
                        })
                    }
                }
            }
            // Errors from nested plans already name the failing task
            Unit::Plan(plan) => self.run_plan(plan, mode),
        };

        if result.is_ok() {
            self.ctx.print_task_complete(name, started.elapsed());
        }
        result
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AssetManifest, Config};
    use crate::runner::plan::{par, seq};
    use crate::runner::registry::TaskRegistry;
    use std::sync::{Arc, Mutex};

    fn sequencer(registry: TaskRegistry) -> (Sequencer, Arc<TaskRegistry>) {
        let registry = Arc::new(registry);
        let ctx = TaskContext::new(Arc::new(Config::default()), registry.clone())
            .with_verbosity(crate::runner::Verbosity::Silent);
        (Sequencer::new(ctx), registry)
    }

    #[test]
    fn test_mode_flows_to_later_steps() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut registry = TaskRegistry::new();
        registry
            .register("env:prod", |_| Ok(Outcome::SetMode(Mode::Production)))
            .unwrap();
        let log = seen.clone();
        registry
            .register("read", move |ctx| {
                log.lock().unwrap().push(ctx.mode()?);
                Ok(Outcome::Done)
            })
            .unwrap();
        registry
            .register_plan("p", vec![seq("env:prod"), par(&["read", "read"])])
            .unwrap();

        let (sequencer, registry) = sequencer(registry);
        let plan = Plan::resolve("p", &registry, &AssetManifest::default()).unwrap();
        sequencer.run(&plan).unwrap();

        assert_eq!(*seen.lock().unwrap(), vec![Mode::Production, Mode::Production]);
    }

    #[test]
    fn test_mode_read_before_set_fails() {
        let mut registry = TaskRegistry::new();
        registry
            .register("read", |ctx| ctx.mode().map(|_| Outcome::Done))
            .unwrap();

        let (sequencer, registry) = sequencer(registry);
        let plan = Plan::resolve("read", &registry, &AssetManifest::default()).unwrap();
        let err = sequencer.run(&plan).unwrap_err();

        assert_eq!(err.failed_task(), Some("read"));
        assert!(matches!(
            err,
            ExecutionError::TaskFailed { source, .. } if matches!(*source, ExecutionError::ModeUnset(_))
        ));
    }

    #[test]
    fn test_nested_plan_mode_change_is_visible_outside() {
        let mut registry = TaskRegistry::new();
        registry
            .register("env:dev", |_| Ok(Outcome::SetMode(Mode::Development)))
            .unwrap();
        registry.register_plan("inner", vec![seq("env:dev")]).unwrap();

        let (sequencer, registry) = sequencer(registry);
        let plan = Plan::resolve("inner", &registry, &AssetManifest::default()).unwrap();
        let mode = sequencer.run_plan(&plan, None).unwrap();
        assert_eq!(mode, Some(Mode::Development));
    }

    #[test]
    fn test_panicking_task_reports_failure() {
        let mut registry = TaskRegistry::new();
        registry.register("ok", |_| Ok(Outcome::Done)).unwrap();
        registry
            .register("boom", |_| -> ExecutionResult<Outcome> { panic!("boom") })
            .unwrap();
        registry.register_plan("p", vec![par(&["ok", "boom"])]).unwrap();

        let (sequencer, registry) = sequencer(registry);
        let plan = Plan::resolve("p", &registry, &AssetManifest::default()).unwrap();
        let err = sequencer.run(&plan).unwrap_err();
        assert_eq!(err.failed_task(), Some("boom"));
    }
}
