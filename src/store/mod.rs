//! # Record Store
//!
//! Persistent collection of student records with unique indexes on
//! registration number and email.
//!
//! The unique indexes are the source of truth for uniqueness. The HTTP layer
//! runs its own existence checks first only to report a friendlier message;
//! two racing creates can both pass those checks, and the store then rejects
//! the second write with a `Validation` error.
//!
//! A handle is opened explicitly from a connection string with [`open`],
//! shared as `Arc<dyn StudentStore>`, and closed with
//! [`StudentStore::close`]. Every operation on a closed handle fails with
//! `StoreError::Unavailable`.

mod checksum;
mod collection;
mod errors;
mod file;
mod log;
mod memory;
mod record;
mod uri;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{StoreError, StoreResult};
pub use file::{CompactionStats, FileStore};
pub use log::{LogReader, LogWriter, LOG_FILE_NAME};
pub use memory::MemoryStore;
pub use record::{LogKind, LogRecord};
pub use uri::StoreUri;

use std::sync::Arc;

use crate::model::{NewStudent, StudentPatch, StudentRecord, UniqueField};

/// Operations on the student collection.
///
/// Implementations serialize mutations internally; callers need no locking.
pub trait StudentStore: Send + Sync {
    /// All records, most recently created first
    fn list_all(&self) -> StoreResult<Vec<StudentRecord>>;

    fn get_by_id(&self, id: &str) -> StoreResult<Option<StudentRecord>>;

    /// Record holding `value` in a unique field, never the one with `exclude_id`
    fn find_by_field(
        &self,
        field: UniqueField,
        value: &str,
        exclude_id: Option<&str>,
    ) -> StoreResult<Option<StudentRecord>>;

    /// Insert with a generated id and timestamps.
    ///
    /// Fails with `StoreError::Validation` on a unique index violation.
    fn create(&self, student: NewStudent) -> StoreResult<StudentRecord>;

    /// Merge `patch` into the record and refresh `updated_at`; `None` if absent.
    fn update_by_id(&self, id: &str, patch: StudentPatch) -> StoreResult<Option<StudentRecord>>;

    /// Remove the record. Deleting an absent id succeeds.
    fn delete_by_id(&self, id: &str) -> StoreResult<()>;

    /// Number of live records
    fn count(&self) -> StoreResult<usize>;

    /// End the handle's lifecycle. Closing twice is a no-op.
    fn close(&self) -> StoreResult<()>;
}

/// Open a store handle from a connection string.
pub fn open(uri: &str) -> StoreResult<Arc<dyn StudentStore>> {
    let store: Arc<dyn StudentStore> = match uri.parse::<StoreUri>()? {
        StoreUri::Memory => Arc::new(MemoryStore::new()),
        StoreUri::File(dir) => Arc::new(FileStore::open(&dir)?),
    };
    Ok(store)
}
