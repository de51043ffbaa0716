//! Configuration parsing and validation
//!
//! This module handles parsing of assetflow.yml configuration files,
//! the asset manifest they carry, and validation of their structure.

pub mod manifest;
pub mod parse;
pub mod schema;
pub mod types;

// Re-export main types
pub use manifest::*;
pub use parse::*;
pub use schema::*;
pub use types::*;
