//! CLI-specific error types
//!
//! All CLI errors are fatal: `main` prints `CODE: message` and exits 1.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    AlreadyInitialized(String),

    #[error("{0}")]
    Unsupported(String),
}

impl CliError {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "STUDENT_CLI_CONFIG_ERROR",
            CliError::Store(StoreError::Corrupted { .. }) => "STUDENT_DATA_CORRUPTION",
            CliError::Store(_) => "STUDENT_STORE_ERROR",
            CliError::Io(_) => "STUDENT_CLI_IO_ERROR",
            CliError::AlreadyInitialized(_) => "STUDENT_CLI_ALREADY_INITIALIZED",
            CliError::Unsupported(_) => "STUDENT_CLI_UNSUPPORTED",
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
