//! Durable record store backed by an append-only log
//!
//! Every mutation appends one record to `<dir>/students.log` and syncs it
//! before the in-memory collection changes. Opening replays the whole log,
//! verifying every checksum; any corruption aborts the open.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::collection::Collection;
use super::errors::{StoreError, StoreResult};
use super::log::{LogReader, LogWriter, LOG_FILE_NAME};
use super::record::{LogKind, LogRecord};
use super::StudentStore;
use crate::model::{NewStudent, StudentPatch, StudentRecord, UniqueField};

struct FileState {
    collection: Collection,
    writer: LogWriter,
}

/// Outcome of a log compaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompactionStats {
    pub records: usize,
    pub bytes_before: u64,
    pub bytes_after: u64,
}

/// File-backed store, opened from `file://<dir>` or a bare path.
pub struct FileStore {
    dir: PathBuf,
    inner: RwLock<Option<FileState>>,
}

impl FileStore {
    /// Opens the store directory, creating it if missing, and replays the log.
    pub fn open(dir: &Path) -> StoreResult<Self> {
        if !dir.exists() {
            fs::create_dir_all(dir).map_err(|e| {
                StoreError::io(format!("Failed to create store directory {}", dir.display()), e)
            })?;
        }

        let log_path = dir.join(LOG_FILE_NAME);
        let collection = if log_path.exists() {
            Self::replay(&log_path)?
        } else {
            Collection::new()
        };
        let writer = LogWriter::open(&log_path)?;

        info!(
            path = %log_path.display(),
            records = collection.len(),
            bytes = writer.current_offset(),
            "file store opened"
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            inner: RwLock::new(Some(FileState { collection, writer })),
        })
    }

    /// Rebuild the collection by applying every log record in file order.
    fn replay(log_path: &Path) -> StoreResult<Collection> {
        let mut collection = Collection::new();
        let mut reader = LogReader::open(log_path)?;

        loop {
            let offset = reader.current_offset();
            let Some(record) = reader.read_next()? else {
                break;
            };

            match record.kind {
                LogKind::Put => {
                    let student = record.decode().map_err(|e| {
                        StoreError::corrupted(offset, format!("Invalid record body: {}", e))
                    })?;
                    if student.id != record.key {
                        return Err(StoreError::corrupted(
                            offset,
                            format!("Record key {} does not match body id {}", record.key, student.id),
                        ));
                    }
                    collection.check_unique(&student).map_err(|e| {
                        StoreError::corrupted(
                            offset,
                            format!("Record {} violates a unique index: {}", student.id, e),
                        )
                    })?;
                    collection.put(record.seq, student);
                }
                LogKind::Delete => {
                    collection.remove(&record.key);
                }
            }
        }

        debug!(records = collection.len(), "log replayed");
        Ok(collection)
    }

    pub fn log_path(&self) -> PathBuf {
        self.dir.join(LOG_FILE_NAME)
    }

    fn read<T>(&self, f: impl FnOnce(&Collection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let state = guard.as_ref().ok_or_else(StoreError::closed)?;
        f(&state.collection)
    }

    fn write<T>(&self, f: impl FnOnce(&mut FileState) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let state = guard.as_mut().ok_or_else(StoreError::closed)?;
        f(state)
    }

    /// Rewrite the log with a single put per live record.
    ///
    /// The new log is written to a temporary file, synced, then renamed over
    /// the old one, so a crash mid-way leaves the previous log intact.
    pub fn compact(&self) -> StoreResult<CompactionStats> {
        let log_path = self.log_path();
        let tmp_path = self.dir.join(format!("{}.compact", LOG_FILE_NAME));

        self.write(|state| {
            let bytes_before = state.writer.current_offset();

            if tmp_path.exists() {
                fs::remove_file(&tmp_path).map_err(|e| {
                    StoreError::io("Failed to remove stale compaction file", e)
                })?;
            }

            let mut tmp = LogWriter::open(&tmp_path)?;
            let entries = state.collection.entries();
            for (seq, record) in &entries {
                tmp.append(&LogRecord::put(*seq, record)?)?;
            }
            tmp.sync()?;
            let bytes_after = tmp.current_offset();
            drop(tmp);

            fs::rename(&tmp_path, &log_path)
                .map_err(|e| StoreError::io("Failed to replace log with compacted log", e))?;
            state.writer = LogWriter::open(&log_path)?;

            let stats = CompactionStats {
                records: entries.len(),
                bytes_before,
                bytes_after,
            };
            info!(
                records = stats.records,
                bytes_before = stats.bytes_before,
                bytes_after = stats.bytes_after,
                "log compacted"
            );
            Ok(stats)
        })
    }
}

impl StudentStore for FileStore {
    fn list_all(&self) -> StoreResult<Vec<StudentRecord>> {
        self.read(|c| Ok(c.list()))
    }

    fn get_by_id(&self, id: &str) -> StoreResult<Option<StudentRecord>> {
        self.read(|c| Ok(c.get(id).cloned()))
    }

    fn find_by_field(
        &self,
        field: UniqueField,
        value: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<StudentRecord>> {
        self.read(|c| Ok(c.find(field, value, exclude_id).cloned()))
    }

    fn create(&self, student: NewStudent) -> StoreResult<StudentRecord> {
        self.write(|state| {
            let (seq, record) = state.collection.prepare_insert(student, Utc::now())?;
            state.writer.append(&LogRecord::put(seq, &record)?)?;
            state.collection.put(seq, record.clone());
            Ok(record)
        })
    }

    fn update_by_id(&self, id: &str, patch: StudentPatch) -> StoreResult<Option<StudentRecord>> {
        self.write(|state| {
            let Some((seq, record)) = state.collection.prepare_update(id, patch, Utc::now())?
            else {
                return Ok(None);
            };
            state.writer.append(&LogRecord::put(seq, &record)?)?;
            state.collection.put(seq, record.clone());
            Ok(Some(record))
        })
    }

    fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        self.write(|state| {
            // absent ids leave no trace in the log
            let Some(seq) = state.collection.seq_of(id) else {
                return Ok(());
            };
            state.writer.append(&LogRecord::delete(seq, id))?;
            state.collection.remove(id);
            Ok(())
        })
    }

    fn count(&self) -> StoreResult<usize> {
        self.read(|c| Ok(c.len()))
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.inner.write().map_err(|_| StoreError::poisoned())?;
        if let Some(mut state) = guard.take() {
            state.writer.sync()?;
            info!(path = %state.writer.path().display(), "file store closed");
        }
        Ok(())
    }
}
