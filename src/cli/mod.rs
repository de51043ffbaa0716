//! CLI interface and argument parsing
//!
//! This module handles command-line parsing, config loading and the task
//! listing.

pub mod app;

// Re-export main types
pub use app::*;
