//! Main CLI application

use crate::config::{
    find_config_file, parse_config_file, project_dir, validate_config, Config,
};
use crate::error::{ExecutionError, FlowError};
use crate::runner::{Plan, Sequencer, TaskContext, TaskRegistry, Verbosity};
use crate::tasks::{build_registry, DEFAULT_TASK};
use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// CLI application
pub struct App {
    /// Parsed configuration
    config: Arc<Config>,
    /// Config file path
    config_path: PathBuf,
    /// Built-in tasks plus configured plans
    registry: Arc<TaskRegistry>,
}

impl App {
    /// Create a new app, searching for the config file from the current directory
    pub fn new() -> Result<Self, FlowError> {
        Self::with_config_file(find_config_file()?)
    }

    /// Create app with a specific config file
    pub fn with_config_file(path: PathBuf) -> Result<Self, FlowError> {
        load_dotenv(&project_dir(&path))?;

        let config = parse_config_file(&path)?;
        validate_config(&config)?;
        let registry = build_registry(&config)?;

        Ok(App {
            config: Arc::new(config),
            config_path: path,
            registry: Arc::new(registry),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &TaskRegistry {
        &self.registry
    }

    /// Directory tasks run in
    pub fn project_dir(&self) -> PathBuf {
        project_dir(&self.config_path)
    }

    /// Task listing printed by `--list`
    pub fn task_listing(&self) -> String {
        let visible: Vec<_> = self.registry.iter().filter(|t| !t.private).collect();
        let width = visible.iter().map(|t| t.name.len()).max().unwrap_or(0);

        let mut out = String::new();
        for task in visible {
            let kind = if task.is_plan() { "plan" } else { "task" };
            out.push_str(&format!(
                "  {:width$}  {}  {}\n",
                task.name,
                kind.dimmed(),
                task.usage.as_deref().unwrap_or(""),
                width = width
            ));
        }
        out
    }

    /// Resolve and run a task or plan
    pub fn run_task(&self, name: &str, verbosity: Verbosity) -> Result<(), FlowError> {
        let plan = Plan::resolve(name, &self.registry, &self.config.assets)?;

        let ctx = TaskContext::new(self.config.clone(), self.registry.clone())
            .with_working_dir(self.project_dir())
            .with_verbosity(verbosity);

        if verbosity >= Verbosity::Verbose {
            ctx.print_debug(&format!("plan: {}", plan));
            ctx.print_debug(&format!("project: {}", self.project_dir().display()));
        }

        let mut outcome: Result<(), ExecutionError> = Ok(());
        Sequencer::new(ctx).run_with(&plan, |result| outcome = result);
        outcome?;
        Ok(())
    }

    /// Run with parsed command line arguments
    pub fn run(&self, matches: &ArgMatches) -> Result<(), FlowError> {
        if matches.get_flag("list") {
            print!("{}", self.task_listing());
            return Ok(());
        }

        let task = matches
            .get_one::<String>("task")
            .map(String::as_str)
            .unwrap_or(DEFAULT_TASK);

        self.run_task(task, get_verbosity(matches))
    }
}

/// Load `.env` from the project directory if there is one
fn load_dotenv(dir: &Path) -> Result<(), FlowError> {
    match dotenvy::from_path(dir.join(".env")) {
        Ok(()) => Ok(()),
        Err(dotenvy::Error::Io(e)) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(dotenvy::Error::Io(e)) => Err(FlowError::Io(e)),
        Err(e) => Err(crate::error::ConfigError::Invalid(format!(".env: {}", e)).into()),
    }
}

/// Build the clap command
pub fn build_command() -> Command {
    Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Build, lint and live-reload web application assets")
        .arg(
            Arg::new("task")
                .value_name("TASK")
                .help("Task or plan to run")
                .default_value(DEFAULT_TASK),
        )
        .arg(
            Arg::new("file")
                .short('f')
                .long("file")
                .value_name("FILE")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to assetflow.yml config file"),
        )
        .arg(
            Arg::new("list")
                .short('l')
                .long("list")
                .help("List tasks and plans")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .help("Only print warnings and errors")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("silent")
                .short('s')
                .long("silent")
                .help("Print no output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Print verbose output")
                .action(ArgAction::SetTrue),
        )
}

/// Get verbosity level from matches
fn get_verbosity(matches: &ArgMatches) -> Verbosity {
    if matches.get_flag("silent") {
        Verbosity::Silent
    } else if matches.get_flag("quiet") {
        Verbosity::Quiet
    } else if matches.get_flag("verbose") {
        Verbosity::Verbose
    } else {
        Verbosity::Normal
    }
}

/// Run the CLI application with the process arguments
pub fn run() -> Result<(), FlowError> {
    run_from(std::env::args_os())
}

/// Run the CLI application with provided arguments
pub fn run_from<I, T>(args: I) -> Result<(), FlowError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = build_command().get_matches_from(args);

    let app = match matches.get_one::<PathBuf>("file") {
        Some(path) => App::with_config_file(path.clone())?,
        None => App::new()?,
    };

    app.run(&matches)
}
