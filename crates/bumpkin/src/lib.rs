//! bumpkin - release bookkeeping CLI.
//!
//! Thin command-line front end over [`bumpkin_release`]: argument parsing,
//! logging setup, error rendering and the process-backed git and bump tool
//! collaborators.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod providers;

pub use cli::{CliError, EXIT_CLI, EXIT_OK, EXIT_RELEASE};
