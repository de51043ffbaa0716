//! Error types for assetflow

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for assetflow operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Main error type for assetflow
#[derive(Error, Debug)]
pub enum FlowError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Task execution errors
    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// YAML parsing errors
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration parsing, validation and plan resolution errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to find config file (searched: {0})")]
    NotFound(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Task '{0}' is not defined")]
    TaskNotFound(String),

    #[error("Task '{0}' is registered more than once")]
    DuplicateTask(String),

    #[error("Circular dependency detected: {0}")]
    CircularDependency(String),

    #[error("Invalid glob '{pattern}': {error}")]
    InvalidGlob { pattern: String, error: String },

    #[error("Asset category '{category}' has no patterns but is used by task '{task}'")]
    EmptyCategory { category: String, task: String },
}

/// Task execution errors
#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error("Command failed with exit code {0:?}")]
    CommandFailed(Option<i32>),

    #[error("Task '{0}' read the environment mode before any env task set it")]
    ModeUnset(String),

    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to transform '{path}': {message}")]
    Transform { path: PathBuf, message: String },

    #[error("Invalid glob '{pattern}': {error}")]
    Glob { pattern: String, error: String },

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("Invalid tool command '{name}': {error}")]
    InvalidTool { name: String, error: String },

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Task '{task}' failed: {source}")]
    TaskFailed {
        task: String,
        #[source]
        source: Box<ExecutionError>,
    },
}

impl ExecutionError {
    /// Wrap an I/O error with the path it concerns
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        ExecutionError::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a transformation error for a file
    pub fn transform(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        ExecutionError::Transform {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Name of the task that failed, when this error came out of the sequencer
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            ExecutionError::TaskFailed { task, .. } => Some(task),
            _ => None,
        }
    }
}

/// Variable interpolation errors
#[derive(Error, Debug)]
pub enum InterpolationError {
    #[error("Variable '{0}' is not defined")]
    UndefinedVariable(String),
}

/// Specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Specialized result type for execution operations
pub type ExecutionResult<T> = std::result::Result<T, ExecutionError>;

/// Specialized result type for interpolation operations
pub type InterpolationResult<T> = std::result::Result<T, InterpolationError>;
