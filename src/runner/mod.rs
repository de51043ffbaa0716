//! Task execution engine
//!
//! This module holds the task registry, plan resolution, the sequencer that
//! runs plans, and the context handed to every task.

pub mod command;
pub mod context;
pub mod interpolate;
pub mod plan;
pub mod registry;
pub mod sequencer;

// Re-export main types
pub use command::*;
pub use context::*;
pub use interpolate::*;
pub use plan::*;
pub use registry::*;
pub use sequencer::*;
