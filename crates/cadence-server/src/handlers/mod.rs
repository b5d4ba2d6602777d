//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod refresh;
pub mod report;

// Re-export all handlers for use in router
pub use refresh::*;
pub use report::*;
