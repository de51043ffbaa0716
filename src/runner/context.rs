//! Execution context for task running
//!
//! The context carries everything a task action may read: the project
//! directory, the parsed configuration, the registry (for tasks that invoke
//! other tasks, such as `watch`) and the environment mode the sequencer has
//! reached so far.

use crate::config::{AssetCategory, Config};
use crate::error::{ExecutionError, ExecutionResult};
use crate::runner::registry::TaskRegistry;
use colored::Colorize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Environment mode, the replacement for a process-wide NODE_ENV flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    /// Value exported to child processes as NODE_ENV
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Development => "development",
            Mode::Production => "production",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Silent = 0,
    Quiet = 1,
    Normal = 2,
    Verbose = 3,
}

/// Execution context handed to every task action
#[derive(Clone)]
pub struct TaskContext {
    /// Project directory; manifest patterns are relative to it
    pub working_dir: PathBuf,

    /// Parsed configuration
    pub config: Arc<Config>,

    /// Registered tasks
    pub registry: Arc<TaskRegistry>,

    /// Name of the task this context was created for
    pub task: String,

    /// Mode set by the last env task, if any
    pub mode: Option<Mode>,

    /// Verbosity level
    pub verbosity: Verbosity,
}

impl TaskContext {
    /// Create a new context with default settings
    pub fn new(config: Arc<Config>, registry: Arc<TaskRegistry>) -> Self {
        TaskContext {
            working_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config,
            registry,
            task: String::new(),
            mode: None,
            verbosity: Verbosity::Normal,
        }
    }

    /// Create a context with a specific working directory
    pub fn with_working_dir(mut self, dir: PathBuf) -> Self {
        self.working_dir = dir;
        self
    }

    /// Set verbosity level
    pub fn with_verbosity(mut self, verbosity: Verbosity) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the starting mode
    pub fn with_mode(mut self, mode: Option<Mode>) -> Self {
        self.mode = mode;
        self
    }

    /// Derive the context a single task runs with
    pub fn for_task(&self, task: &str, mode: Option<Mode>) -> Self {
        TaskContext {
            task: task.to_string(),
            mode,
            ..self.clone()
        }
    }

    /// Current mode; reading it before an env task ran is an error
    pub fn mode(&self) -> ExecutionResult<Mode> {
        self.mode
            .ok_or_else(|| ExecutionError::ModeUnset(self.task.clone()))
    }

    /// Resolve a project-relative path
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.working_dir.join(relative)
    }

    /// Manifest patterns of one category
    pub fn patterns(&self, category: AssetCategory) -> Vec<String> {
        self.config.assets.patterns(category).to_vec()
    }

    /// Interpreter used for external tools
    pub fn interpreter(&self) -> Vec<String> {
        self.config
            .interpreter
            .clone()
            .unwrap_or_else(|| vec!["sh".to_string(), "-c".to_string()])
    }

    /// External command configured for the current task, if any
    pub fn tool(&self) -> Option<&str> {
        self.config.tools.get(&self.task).map(|s| s.as_str())
    }

    fn label(&self) -> String {
        if self.task.is_empty() {
            String::new()
        } else {
            format!("[{}] ", self.task.cyan())
        }
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if self.verbosity >= Verbosity::Normal {
            eprintln!("{} {}{}", "[INFO]".green(), self.label(), message);
        }
    }

    /// Print warning message
    pub fn print_warn(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}{}", "[WARN]".yellow(), self.label(), message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        if self.verbosity >= Verbosity::Quiet {
            eprintln!("{} {}{}", "[ERROR]".red().bold(), self.label(), message);
        }
    }

    /// Print debug message (only in verbose mode)
    pub fn print_debug(&self, message: &str) {
        if self.verbosity >= Verbosity::Verbose {
            eprintln!("{} {}{}", "[DEBUG]".dimmed(), self.label(), message);
        }
    }

    /// Print task start message
    pub fn print_task_start(&self, task_name: &str) {
        self.print_info(&format!("Starting '{}'...", task_name.cyan()));
    }

    /// Print task complete message
    pub fn print_task_complete(&self, task_name: &str, elapsed: Duration) {
        self.print_info(&format!(
            "Finished '{}' after {}",
            task_name.cyan(),
            format_elapsed(elapsed).as_str().magenta()
        ));
    }

    /// Print task failure message
    pub fn print_task_failed(&self, task_name: &str, error: &ExecutionError) {
        self.print_error(&format!("'{}' errored: {}", task_name.cyan(), error));
    }
}

/// Human readable duration, `12 ms` or `1.4 s`
pub fn format_elapsed(elapsed: Duration) -> String {
    let millis = elapsed.as_millis();
    if millis < 1000 {
        format!("{} ms", millis)
    } else {
        format!("{:.1} s", elapsed.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> TaskContext {
        TaskContext::new(Arc::new(Config::default()), Arc::new(TaskRegistry::new()))
    }

    #[test]
    fn test_context_new() {
        let ctx = context();
        assert_eq!(ctx.verbosity, Verbosity::Normal);
        assert_eq!(ctx.interpreter(), vec!["sh", "-c"]);
        assert!(ctx.mode.is_none());
    }

    #[test]
    fn test_mode_unset_is_an_error() {
        let ctx = context().for_task("watch", None);
        match ctx.mode() {
            Err(ExecutionError::ModeUnset(task)) => assert_eq!(task, "watch"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_for_task_carries_mode() {
        let ctx = context().for_task("nodemon", Some(Mode::Production));
        assert_eq!(ctx.task, "nodemon");
        assert_eq!(ctx.mode().unwrap(), Mode::Production);
        assert_eq!(ctx.mode().unwrap().as_str(), "production");
    }

    #[test]
    fn test_tool_lookup_uses_task_name() {
        let mut config = Config::default();
        config
            .tools
            .insert("eslint".to_string(), "eslint ${files}".to_string());
        let ctx = TaskContext::new(Arc::new(config), Arc::new(TaskRegistry::new()));

        assert_eq!(ctx.for_task("eslint", None).tool(), Some("eslint ${files}"));
        assert_eq!(ctx.for_task("csslint", None).tool(), None);
    }

    #[test]
    fn test_verbosity_levels() {
        assert!(Verbosity::Verbose > Verbosity::Normal);
        assert!(Verbosity::Normal > Verbosity::Quiet);
        assert!(Verbosity::Quiet > Verbosity::Silent);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(12)), "12 ms");
        assert_eq!(format_elapsed(Duration::from_millis(1400)), "1.4 s");
    }
}
