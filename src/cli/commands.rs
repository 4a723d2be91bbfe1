//! CLI command implementations
//!
//! Every command resolves its configuration the same way: defaults, then the
//! config file if present, then environment variables and flags.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};
use tracing::info;

use crate::config::{Config, ConfigOverrides};
use crate::http_server::{shutdown_signal, HttpServer};
use crate::logging;
use crate::store::{self, FileStore, StoreUri, StudentStore};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};

/// Parse arguments and run the selected command
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Dispatch a parsed command
pub fn run_command(command: Command) -> CliResult<()> {
    match command {
        Command::Serve { store, host, port } => {
            let overrides = ConfigOverrides {
                host,
                port,
                ..store.overrides()
            };
            serve(&store.config, overrides)
        }
        Command::Init { store } => init(&store.config, store.overrides()),
        Command::Verify { store } => verify(&store.config, store.overrides()),
        Command::Compact { store } => compact(&store.config, store.overrides()),
    }
}

fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value).map_err(io::Error::from)?;
    writeln!(stdout)?;
    Ok(())
}

/// Open the store, serve HTTP until a shutdown signal, then close the store.
///
/// The store is closed even when the server fails; the server error wins.
pub fn serve(config_path: &Path, overrides: ConfigOverrides) -> CliResult<()> {
    let config = Config::load_with(config_path, overrides)?;
    logging::init(config.log_format);
    info!(
        config = %config_path.display(),
        store = %config.store_uri,
        addr = %config.http.socket_addr(),
        "starting student-records"
    );

    let store = store::open(&config.store_uri)?;
    let server = HttpServer::new(config.http.clone(), Arc::clone(&store));

    let runtime = tokio::runtime::Runtime::new()?;
    let served = runtime.block_on(server.start(shutdown_signal()));
    let closed = store.close();

    served?;
    closed?;
    Ok(())
}

/// Write a default config file and create the file store directory.
///
/// Refuses to overwrite an existing config file.
pub fn init(config_path: &Path, overrides: ConfigOverrides) -> CliResult<()> {
    if config_path.exists() {
        return Err(CliError::AlreadyInitialized(format!(
            "config file already exists: {}",
            config_path.display()
        )));
    }

    let mut config = Config::default();
    config.apply(overrides);
    config.validate()?;

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    config.write(config_path)?;

    if let StoreUri::File(dir) = config.store()? {
        FileStore::open(&dir)?.close()?;
    }

    write_json(&json!({
        "status": "initialized",
        "config": config_path.display().to_string(),
        "store_uri": config.store_uri,
    }))
}

/// Open the store, which replays and checksum-verifies the whole log.
pub fn verify(config_path: &Path, overrides: ConfigOverrides) -> CliResult<()> {
    let config = Config::load_with(config_path, overrides)?;
    logging::init(config.log_format);

    let store = store::open(&config.store_uri)?;
    let records = store.count()?;
    store.close()?;

    write_json(&json!({
        "status": "ok",
        "store_uri": config.store_uri,
        "records": records,
    }))
}

/// Rewrite the file store log keeping only live records.
pub fn compact(config_path: &Path, overrides: ConfigOverrides) -> CliResult<()> {
    let config = Config::load_with(config_path, overrides)?;
    logging::init(config.log_format);

    let StoreUri::File(dir) = config.store()? else {
        return Err(CliError::Unsupported(
            "compaction requires a file store".to_string(),
        ));
    };

    let store = FileStore::open(&dir)?;
    let stats = store.compact();
    let closed = store.close();
    let stats = stats?;
    closed?;

    write_json(&json!({
        "status": "compacted",
        "store_uri": config.store_uri,
        "records": stats.records,
        "bytes_before": stats.bytes_before,
        "bytes_after": stats.bytes_after,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewStudent;
    use crate::store::{StoreError, LOG_FILE_NAME};
    use tempfile::TempDir;

    fn file_overrides(dir: &Path) -> ConfigOverrides {
        ConfigOverrides {
            store_uri: Some(format!("file://{}", dir.display())),
            ..Default::default()
        }
    }

    #[test]
    fn test_init_writes_config_once() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("conf").join("student-records.json");
        let store_dir = tmp.path().join("data");

        init(&config_path, file_overrides(&store_dir)).unwrap();
        assert!(config_path.exists());
        assert!(store_dir.join(LOG_FILE_NAME).exists());

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.store().unwrap(), StoreUri::File(store_dir.clone()));

        let err = init(&config_path, file_overrides(&store_dir)).unwrap_err();
        assert!(matches!(err, CliError::AlreadyInitialized(_)));
    }

    #[test]
    fn test_verify_reports_corruption() {
        let tmp = TempDir::new().unwrap();
        let store_dir = tmp.path().join("data");
        let config_path = tmp.path().join("absent.json");

        {
            let store = FileStore::open(&store_dir).unwrap();
            store
                .create(NewStudent {
                    name: "A".to_string(),
                    registration_number: "001".to_string(),
                    email: "a@x.com".to_string(),
                    class_label: "X-1".to_string(),
                    major: "SIJA".to_string(),
                })
                .unwrap();
            store.close().unwrap();
        }
        verify(&config_path, file_overrides(&store_dir)).unwrap();

        let log = store_dir.join(LOG_FILE_NAME);
        let mut bytes = fs::read(&log).unwrap();
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        fs::write(&log, bytes).unwrap();

        let err = verify(&config_path, file_overrides(&store_dir)).unwrap_err();
        assert!(matches!(err, CliError::Store(StoreError::Corrupted { .. })));
        assert_eq!(err.code(), "STUDENT_DATA_CORRUPTION");
    }

    #[test]
    fn test_compact_file_store_keeps_live_records() {
        let tmp = TempDir::new().unwrap();
        let store_dir = tmp.path().join("data");

        {
            let store = FileStore::open(&store_dir).unwrap();
            for nis in ["001", "002"] {
                let created = store
                    .create(NewStudent {
                        name: "A".to_string(),
                        registration_number: nis.to_string(),
                        email: format!("{}@x.com", nis),
                        class_label: "X-1".to_string(),
                        major: "SIJA".to_string(),
                    })
                    .unwrap();
                if nis == "002" {
                    store.delete_by_id(&created.id).unwrap();
                }
            }
            store.close().unwrap();
        }

        compact(&tmp.path().join("absent.json"), file_overrides(&store_dir)).unwrap();

        let reopened = FileStore::open(&store_dir).unwrap();
        assert_eq!(reopened.count().unwrap(), 1);
    }

    #[test]
    fn test_compact_requires_file_store() {
        let tmp = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            store_uri: Some("memory://".to_string()),
            ..Default::default()
        };
        let err = compact(&tmp.path().join("absent.json"), overrides).unwrap_err();
        assert!(matches!(err, CliError::Unsupported(_)));
    }
}
