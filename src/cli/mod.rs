//! CLI module
//!
//! Provides command-line interface for:
//! - serve: open the store and serve the HTTP API
//! - init: write a default config and create the store directory
//! - verify: replay and checksum-verify the store log
//! - compact: rewrite the store log with live records only

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command, StoreArgs};
pub use commands::{compact, init, run, run_command, serve, verify};
pub use errors::{CliError, CliResult};
