//! CLI argument definitions using clap
//!
//! Commands:
//! - student-records serve
//! - student-records init
//! - student-records verify
//! - student-records compact

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigOverrides, LogFormat};

/// Student record management service
#[derive(Parser, Debug)]
#[command(name = "student-records")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Path to configuration file (optional; defaults apply if missing)
    #[arg(long, env = "STUDENT_CONFIG", default_value = "./student-records.json")]
    pub config: PathBuf,

    /// Store connection string: memory://, file://<dir> or a directory path
    #[arg(long = "store", env = "STUDENT_STORE_URI")]
    pub store_uri: Option<String>,

    /// Log output format
    #[arg(long, env = "STUDENT_LOG_FORMAT", value_enum)]
    pub log_format: Option<LogFormat>,
}

impl StoreArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            store_uri: self.store_uri.clone(),
            log_format: self.log_format,
            ..Default::default()
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open the store and serve the HTTP API until interrupted
    Serve {
        #[command(flatten)]
        store: StoreArgs,

        /// Host to bind to
        #[arg(long, env = "STUDENT_HOST")]
        host: Option<String>,

        /// Port to bind to
        #[arg(long, env = "STUDENT_PORT")]
        port: Option<u16>,
    },

    /// Write a default configuration file and create the store directory
    Init {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Replay the store log, verifying every checksum
    Verify {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Rewrite the store log keeping only live records
    Compact {
        #[command(flatten)]
        store: StoreArgs,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
