//! Append-only student log
//!
//! `LogWriter` appends checksummed records and syncs after every append.
//! `LogReader` scans the file sequentially and treats any checksum or
//! structure failure as corruption at the current offset.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};

use tracing::{error, warn};

use super::errors::{StoreError, StoreResult};
use super::record::{LogRecord, MIN_RECORD_SIZE};

/// Name of the log file inside the store directory
pub const LOG_FILE_NAME: &str = "students.log";

/// Sequential reader over a log file.
pub struct LogReader {
    reader: BufReader<File>,
    current_offset: u64,
    file_size: u64,
}

impl LogReader {
    /// Opens the log file for reading.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let file = File::open(path).map_err(|e| {
            StoreError::io(format!("Failed to open log file {}", path.display()), e)
        })?;

        let file_size = file
            .metadata()
            .map_err(|e| StoreError::io("Failed to read log metadata", e))?
            .len();

        Ok(Self {
            reader: BufReader::new(file),
            current_offset: 0,
            file_size,
        })
    }

    /// Returns the current read offset.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Reads the next record.
    ///
    /// - `Ok(Some(record))` if a record was read
    /// - `Ok(None)` at end of file
    /// - `Err(Corrupted)` on checksum or structure failure
    pub fn read_next(&mut self) -> StoreResult<Option<LogRecord>> {
        if self.current_offset >= self.file_size {
            return Ok(None);
        }

        let remaining = self.file_size - self.current_offset;
        if remaining < MIN_RECORD_SIZE as u64 {
            return Err(StoreError::corrupted(
                self.current_offset,
                format!(
                    "Truncated log: {} bytes remaining, minimum record size is {}",
                    remaining, MIN_RECORD_SIZE
                ),
            ));
        }

        let mut len_buf = [0u8; 4];
        self.reader.read_exact(&mut len_buf).map_err(|e| {
            StoreError::corrupted(
                self.current_offset,
                format!("Failed to read record length: {}", e),
            )
        })?;
        let record_length = u32::from_le_bytes(len_buf) as u64;

        if record_length < MIN_RECORD_SIZE as u64 {
            return Err(StoreError::corrupted(
                self.current_offset,
                format!("Invalid record length: {}", record_length),
            ));
        }

        if record_length > remaining {
            return Err(StoreError::corrupted(
                self.current_offset,
                format!(
                    "Record length {} exceeds remaining file size {}",
                    record_length, remaining
                ),
            ));
        }

        let mut record_buf = vec![0u8; record_length as usize];
        record_buf[..4].copy_from_slice(&len_buf);
        self.reader.read_exact(&mut record_buf[4..]).map_err(|e| {
            StoreError::corrupted(
                self.current_offset,
                format!("Failed to read record body: {}", e),
            )
        })?;

        let (record, consumed) = LogRecord::deserialize(&record_buf)
            .map_err(|e| StoreError::corrupted(self.current_offset, e.to_string()))?;

        self.current_offset += consumed as u64;
        Ok(Some(record))
    }
}

/// Appending writer over a log file.
///
/// A failed append is cut back off the file. If that also fails the writer
/// refuses further appends, since the tail of the log is unknown.
pub struct LogWriter {
    path: PathBuf,
    file: File,
    current_offset: u64,
    failed: bool,
}

impl LogWriter {
    /// Opens (creating if missing) the log file for appending.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|e| {
                    StoreError::io(
                        format!("Failed to create store directory {}", parent.display()),
                        e,
                    )
                })?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                StoreError::io(format!("Failed to open log file {}", path.display()), e)
            })?;

        let current_offset = file
            .metadata()
            .map_err(|e| StoreError::io("Failed to read log metadata", e))?
            .len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            current_offset,
            failed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size of the log in bytes
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends a record and syncs it to disk.
    ///
    /// Returns the byte offset where the record was written.
    pub fn append(&mut self, record: &LogRecord) -> StoreResult<u64> {
        if self.failed {
            return Err(StoreError::Unavailable(format!(
                "log {} has an unrecoverable tail, reopen the store",
                self.path.display()
            )));
        }

        let bytes = record.serialize();
        let offset = self.current_offset;

        let written = self
            .file
            .write_all(&bytes)
            .map_err(|e| {
                StoreError::io(format!("Failed to append log record for {}", record.key), e)
            })
            .and_then(|_| {
                self.file.sync_all().map_err(|e| {
                    StoreError::io(format!("fsync failed after log record for {}", record.key), e)
                })
            });

        if let Err(e) = written {
            self.rollback(offset);
            return Err(e);
        }

        self.current_offset += bytes.len() as u64;
        Ok(offset)
    }

    /// Cut the file back to `offset`, the end of the last good record.
    fn rollback(&mut self, offset: u64) {
        let truncated = self
            .file
            .set_len(offset)
            .and_then(|_| self.file.sync_all());
        match truncated {
            Ok(()) => warn!(path = %self.path.display(), offset, "rolled back failed log append"),
            Err(e) => {
                error!(path = %self.path.display(), offset, error = %e, "log rollback failed");
                self.failed = true;
            }
        }
    }

    /// Flushes and syncs without writing.
    pub fn sync(&mut self) -> StoreResult<()> {
        self.file
            .flush()
            .and_then(|_| self.file.sync_all())
            .map_err(|e| StoreError::io("Failed to sync log file", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_then_scan() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOG_FILE_NAME);

        let mut writer = LogWriter::open(&path).unwrap();
        let first = writer.append(&LogRecord::delete(1, "a")).unwrap();
        let second = writer.append(&LogRecord::delete(2, "b")).unwrap();
        assert_eq!(first, 0);
        assert!(second > first);

        let mut reader = LogReader::open(&path).unwrap();
        assert_eq!(reader.read_next().unwrap().unwrap().key, "a");
        assert_eq!(reader.current_offset(), second);
        assert_eq!(reader.read_next().unwrap().unwrap().key, "b");
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_trailing_garbage_is_corruption() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOG_FILE_NAME);

        let mut writer = LogWriter::open(&path).unwrap();
        let end = {
            writer.append(&LogRecord::delete(1, "a")).unwrap();
            writer.current_offset()
        };
        drop(writer);

        let mut bytes = fs::read(&path).unwrap();
        bytes.extend_from_slice(&[0xAB; 5]);
        fs::write(&path, bytes).unwrap();

        let mut reader = LogReader::open(&path).unwrap();
        assert!(reader.read_next().unwrap().is_some());
        match reader.read_next() {
            Err(StoreError::Corrupted { offset, .. }) => assert_eq!(offset, end),
            other => panic!("expected corruption, got {:?}", other.map(|r| r.map(|r| r.key))),
        }
    }

    #[test]
    fn test_writer_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join(LOG_FILE_NAME);
        let writer = LogWriter::open(&path).unwrap();
        assert_eq!(writer.current_offset(), 0);
        assert!(path.exists());
    }

    #[test]
    fn test_rollback_discards_partial_record() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOG_FILE_NAME);

        let mut writer = LogWriter::open(&path).unwrap();
        writer.append(&LogRecord::delete(1, "a")).unwrap();
        let good_end = writer.current_offset();

        // a torn write: half of the next record reached the file
        let torn = LogRecord::delete(2, "b").serialize();
        writer.file.write_all(&torn[..torn.len() / 2]).unwrap();
        writer.rollback(good_end);
        assert!(!writer.failed);
        assert_eq!(fs::metadata(&path).unwrap().len(), good_end);

        writer.append(&LogRecord::delete(3, "c")).unwrap();
        drop(writer);

        let mut reader = LogReader::open(&path).unwrap();
        assert_eq!(reader.read_next().unwrap().unwrap().key, "a");
        assert_eq!(reader.read_next().unwrap().unwrap().key, "c");
        assert!(reader.read_next().unwrap().is_none());
    }

    #[test]
    fn test_failed_writer_refuses_appends() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(LOG_FILE_NAME);

        let mut writer = LogWriter::open(&path).unwrap();
        writer.failed = true;
        assert!(matches!(
            writer.append(&LogRecord::delete(1, "a")),
            Err(StoreError::Unavailable(_))
        ));
        assert_eq!(fs::metadata(&path).unwrap().len(), 0);
    }
}
