//! Tracing subscriber setup
//!
//! Filter comes from `RUST_LOG` (default `info`); output goes to stderr as
//! human-readable text or one JSON object per line. Stdout is left to
//! command output.

use std::io;

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LogFormat;

/// Install the global subscriber.
///
/// Returns false if one was already installed (e.g. by a test harness).
pub fn init(format: LogFormat) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_target(false)
            .try_init(),
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .with_current_span(false)
            .try_init(),
    };
    result.is_ok()
}
