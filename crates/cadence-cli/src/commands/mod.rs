//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `core` - Shared utilities (config, source and reference date resolution)
//! - `analyze` - Report commands (analyze, insights, timeline)
//! - `serve` - Web server command

pub mod analyze;
pub mod core;
pub mod serve;

// Re-export command functions for main.rs
pub use analyze::*;
pub use core::*;
pub use serve::*;
