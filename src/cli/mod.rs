//! CLI module for geoportal
//!
//! Provides command-line interface for:
//! - serve: Run the HTTP API server
//! - check-config: Validate a configuration file

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check_config, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
