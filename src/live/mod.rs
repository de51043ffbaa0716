//! File watching and browser live reload

pub mod reload;
pub mod watcher;

pub use reload::*;
pub use watcher::*;
