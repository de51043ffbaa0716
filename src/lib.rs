//! assetflow - a YAML-configured asset build and live-reload task runner
//!
//! Named tasks lint, bundle and recompress the assets of a web application,
//! and plans chain them into sequential steps and parallel groups. A watcher
//! re-runs tasks on change and tells connected browsers to reload.

// Public modules
pub mod assets;
pub mod cli;
pub mod config;
pub mod error;
pub mod live;
pub mod runner;
pub mod tasks;

// Re-export commonly used types
pub use error::{FlowError, Result};

/// Current version of assetflow
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
