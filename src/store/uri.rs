//! Store connection strings
//!
//! - `memory://` opens a volatile [`MemoryStore`](super::MemoryStore)
//! - `file://<dir>` or a bare path opens a [`FileStore`](super::FileStore)

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::errors::StoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreUri {
    Memory,
    File(PathBuf),
}

impl FromStr for StoreUri {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(StoreError::InvalidUri("connection string is empty".to_string()));
        }

        match s.split_once("://") {
            Some(("memory", "")) => Ok(StoreUri::Memory),
            Some(("memory", rest)) => Err(StoreError::InvalidUri(format!(
                "memory:// takes no path, got {:?}",
                rest
            ))),
            Some(("file", "")) => Err(StoreError::InvalidUri(
                "file:// requires a directory path".to_string(),
            )),
            Some(("file", path)) => Ok(StoreUri::File(PathBuf::from(path))),
            Some((scheme, _)) => Err(StoreError::InvalidUri(format!(
                "unsupported scheme {:?}",
                scheme
            ))),
            None => Ok(StoreUri::File(PathBuf::from(s))),
        }
    }
}

impl fmt::Display for StoreUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreUri::Memory => write!(f, "memory://"),
            StoreUri::File(path) => write!(f, "file://{}", path.display()),
        }
    }
}
