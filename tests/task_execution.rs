//! Integration tests for plan sequencing

mod common;

use assetflow::config::{AssetManifest, Config};
use assetflow::error::ExecutionError;
use assetflow::runner::{
    par, seq, Mode, Outcome, Plan, Sequencer, TaskContext, TaskRegistry, Verbosity,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

type Trace = Arc<Mutex<Vec<String>>>;

fn tracing_task(registry: &mut TaskRegistry, name: &str, trace: &Trace) {
    let trace = trace.clone();
    let label = name.to_string();
    registry
        .register(name, move |_| {
            trace.lock().unwrap().push(format!("start {}", label));
            thread::sleep(Duration::from_millis(20));
            trace.lock().unwrap().push(format!("end {}", label));
            Ok(Outcome::Done)
        })
        .unwrap();
}

fn run(registry: TaskRegistry, name: &str) -> Result<(), ExecutionError> {
    let registry = Arc::new(registry);
    let plan = Plan::resolve(name, &registry, &AssetManifest::default()).unwrap();
    let ctx = TaskContext::new(Arc::new(Config::default()), registry)
        .with_verbosity(Verbosity::Silent);
    Sequencer::new(ctx).run(&plan)
}

fn position(trace: &[String], entry: &str) -> usize {
    trace
        .iter()
        .position(|e| e == entry)
        .unwrap_or_else(|| panic!("'{}' missing from {:?}", entry, trace))
}

#[test]
fn test_sequential_and_parallel_ordering() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TaskRegistry::new();
    for name in ["A", "B", "C", "D"] {
        tracing_task(&mut registry, name, &trace);
    }
    registry
        .register_plan("plan", vec![seq("A"), par(&["B", "C"]), seq("D")])
        .unwrap();

    run(registry, "plan").unwrap();

    let trace = trace.lock().unwrap();
    assert_eq!(trace.len(), 8);
    assert_eq!(trace[0], "start A");
    assert_eq!(trace[1], "end A");
    assert_eq!(trace[6], "start D");
    assert_eq!(trace[7], "end D");

    // B and C both start after A and end before D
    for member in ["B", "C"] {
        assert!(position(&trace, &format!("start {}", member)) > position(&trace, "end A"));
        assert!(position(&trace, &format!("end {}", member)) < position(&trace, "start D"));
    }
}

#[test]
fn test_parallel_members_all_start_before_any_completes() {
    let started = Arc::new(AtomicUsize::new(0));
    let mut registry = TaskRegistry::new();

    for name in ["B", "C", "E"] {
        let started = started.clone();
        registry
            .register(name, move |_| {
                started.fetch_add(1, Ordering::SeqCst);
                let deadline = Instant::now() + Duration::from_secs(5);
                while started.load(Ordering::SeqCst) < 3 {
                    if Instant::now() > deadline {
                        return Err(ExecutionError::Watch("siblings never started".into()));
                    }
                    thread::sleep(Duration::from_millis(1));
                }
                Ok(Outcome::Done)
            })
            .unwrap();
    }
    registry.register_plan("group", vec![par(&["B", "C", "E"])]).unwrap();

    run(registry, "group").unwrap();
    assert_eq!(started.load(Ordering::SeqCst), 3);
}

#[test]
fn test_failure_aborts_later_steps() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TaskRegistry::new();
    tracing_task(&mut registry, "A", &trace);
    tracing_task(&mut registry, "D", &trace);
    registry
        .register("fail", |_| Err(ExecutionError::CommandFailed(Some(2))))
        .unwrap();
    registry
        .register_plan("plan", vec![seq("A"), seq("fail"), seq("D")])
        .unwrap();

    let registry = Arc::new(registry);
    let plan = Plan::resolve("plan", &registry, &AssetManifest::default()).unwrap();
    let ctx = TaskContext::new(Arc::new(Config::default()), registry)
        .with_verbosity(Verbosity::Silent);

    let mut calls = Vec::new();
    Sequencer::new(ctx).run_with(&plan, |result| calls.push(result));

    assert_eq!(calls.len(), 1);
    let err = calls.pop().unwrap().unwrap_err();
    assert_eq!(err.failed_task(), Some("fail"));
    assert_eq!(*trace.lock().unwrap(), vec!["start A", "end A"]);
}

#[test]
fn test_failure_in_parallel_group_is_reported_after_siblings_finish() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TaskRegistry::new();
    tracing_task(&mut registry, "slow", &trace);
    tracing_task(&mut registry, "after", &trace);
    registry
        .register("fail", |_| Err(ExecutionError::CommandFailed(None)))
        .unwrap();
    registry
        .register_plan("plan", vec![par(&["fail", "slow"]), seq("after")])
        .unwrap();

    let err = run(registry, "plan").unwrap_err();
    assert_eq!(err.failed_task(), Some("fail"));
    assert_eq!(*trace.lock().unwrap(), vec!["start slow", "end slow"]);
}

#[test]
fn test_successful_plan_calls_done_once() {
    let mut registry = TaskRegistry::new();
    registry.register("ok", |_| Ok(Outcome::Done)).unwrap();
    registry.register_plan("plan", vec![seq("ok"), par(&["ok", "ok"])]).unwrap();

    let registry = Arc::new(registry);
    let plan = Plan::resolve("plan", &registry, &AssetManifest::default()).unwrap();
    let ctx = TaskContext::new(Arc::new(Config::default()), registry)
        .with_verbosity(Verbosity::Silent);

    let mut calls = 0;
    let mut ok = false;
    Sequencer::new(ctx).run_with(&plan, |result| {
        calls += 1;
        ok = result.is_ok();
    });
    assert_eq!(calls, 1);
    assert!(ok);
}

#[test]
fn test_empty_plan_succeeds() {
    let mut registry = TaskRegistry::new();
    registry.register_plan("nothing", Vec::new()).unwrap();

    run(registry, "nothing").unwrap();
}

#[test]
fn test_nested_plan_runs_as_one_step() {
    let trace: Trace = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TaskRegistry::new();
    for name in ["A", "B", "C"] {
        tracing_task(&mut registry, name, &trace);
    }
    registry.register_plan("inner", vec![seq("A"), seq("B")]).unwrap();
    registry
        .register_plan("outer", vec![par(&["inner", "C"])])
        .unwrap();

    run(registry, "outer").unwrap();

    let trace = trace.lock().unwrap();
    assert!(position(&trace, "end A") < position(&trace, "start B"));
    assert_eq!(trace.len(), 6);
}

#[test]
fn test_unknown_name_is_rejected_at_resolution() {
    let ran = Arc::new(AtomicUsize::new(0));
    let mut registry = TaskRegistry::new();
    let counter = ran.clone();
    registry
        .register("A", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Outcome::Done)
        })
        .unwrap();
    registry
        .register_plan("plan", vec![seq("A"), seq("missing")])
        .unwrap();

    let result = Plan::resolve("plan", &registry, &AssetManifest::default());
    assert!(result.is_err());
    assert_eq!(ran.load(Ordering::SeqCst), 0);
}

#[test]
fn test_mode_is_visible_to_the_step_after_env_task() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TaskRegistry::new();
    registry
        .register("env:prod", |_| Ok(Outcome::SetMode(Mode::Production)))
        .unwrap();
    let log = seen.clone();
    registry
        .register("report", move |ctx| {
            log.lock().unwrap().push(ctx.mode);
            Ok(Outcome::Done)
        })
        .unwrap();
    registry
        .register_plan("plan", vec![seq("report"), seq("env:prod"), seq("report")])
        .unwrap();

    run(registry, "plan").unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![None, Some(Mode::Production)]);
}
