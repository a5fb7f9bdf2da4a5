// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! CLI module for the pose extraction tool.
//!
//! This module contains the command-line interface logic: argument parsing
//! and the implementations of the `extract`, `batch` and `validate`
//! commands.

// Modules
/// CLI arguments.
pub mod args;

/// Extraction commands (single video and batch).
pub mod extract;

/// Logging helpers.
pub mod logging;

/// Document validation command.
pub mod validate;
