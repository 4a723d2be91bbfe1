//! Process configuration
//!
//! Loaded from an optional JSON file, then overridden by environment
//! variables and command-line flags (resolved together by the CLI):
//!
//! ```json
//! {
//!   "store_uri": "file://./data",
//!   "host": "0.0.0.0",
//!   "port": 3000,
//!   "cors_origins": [],
//!   "log_format": "text"
//! }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http_server::HttpServerConfig;
use crate::store::StoreUri;

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config JSON in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write config {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Store connection string (`memory://`, `file://<dir>` or a path)
    #[serde(default = "default_store_uri")]
    pub store_uri: String,

    #[serde(default)]
    pub log_format: LogFormat,

    #[serde(flatten)]
    pub http: HttpServerConfig,
}

fn default_store_uri() -> String {
    "file://./data".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_uri: default_store_uri(),
            log_format: LogFormat::default(),
            http: HttpServerConfig::default(),
        }
    }
}

/// Values taken from the environment or the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub store_uri: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub log_format: Option<LogFormat>,
}

impl Config {
    /// Load the file at `path`, or defaults if it does not exist.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        Self::load_with(path, ConfigOverrides::default())
    }

    /// Load, apply overrides, and validate.
    pub fn load_with(path: &Path, overrides: ConfigOverrides) -> ConfigResult<Self> {
        let mut config = match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if let Some(store_uri) = overrides.store_uri {
            self.store_uri = store_uri;
        }
        if let Some(host) = overrides.host {
            self.http.host = host;
        }
        if let Some(port) = overrides.port {
            self.http.port = port;
        }
        if let Some(log_format) = overrides.log_format {
            self.log_format = log_format;
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.http.port == 0 {
            return Err(ConfigError::Invalid("port must be > 0".to_string()));
        }
        if self.http.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        self.store()?;
        Ok(())
    }

    /// Parsed store connection string
    pub fn store(&self) -> ConfigResult<StoreUri> {
        self.store_uri
            .parse()
            .map_err(|e: crate::store::StoreError| ConfigError::Invalid(e.to_string()))
    }

    /// Write as pretty JSON
    pub fn write(&self, path: &Path) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Invalid(format!("failed to encode config: {}", e)))?;
        fs::write(path, json + "\n").map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}
