//! CLI command handlers for md2preset.
//!
//! This module provides the headless, scriptable conversion command used by
//! the binary and its integration tests.

pub mod common;
pub mod convert;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use convert::ConvertArgs;
