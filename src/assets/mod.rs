//! Asset selection and filesystem helpers
//!
//! Tasks resolve manifest categories to concrete files through [`expand`]
//! and write their results through the helpers in [`fs`].

pub mod fs;
pub mod glob;

// Re-export main types
pub use self::fs::*;
pub use self::glob::*;
