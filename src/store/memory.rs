//! Volatile record store

use std::sync::RwLock;

use chrono::Utc;

use super::collection::Collection;
use super::errors::{StoreError, StoreResult};
use super::StudentStore;
use crate::model::{NewStudent, StudentPatch, StudentRecord, UniqueField};

/// In-memory store, opened from `memory://`.
///
/// `None` inside the lock marks a closed handle.
#[derive(Debug)]
pub struct MemoryStore {
    inner: RwLock<Option<Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Some(Collection::new())),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Collection) -> StoreResult<T>) -> StoreResult<T> {
        let guard = self.inner.read().map_err(|_| StoreError::poisoned())?;
        let collection = guard.as_ref().ok_or_else(StoreError::closed)?;
        f(collection)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Collection) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.inner.write().map_err(|_| StoreError::poisoned())?;
        let collection = guard.as_mut().ok_or_else(StoreError::closed)?;
        f(collection)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StudentStore for MemoryStore {
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
        self.write(|c| {
            let (seq, record) = c.prepare_insert(student, Utc::now())?;
            c.put(seq, record.clone());
            Ok(record)
        })
    }

    fn update_by_id(&self, id: &str, patch: StudentPatch) -> StoreResult<Option<StudentRecord>> {
        self.write(|c| {
            let Some((seq, record)) = c.prepare_update(id, patch, Utc::now())? else {
                return Ok(None);
            };
            c.put(seq, record.clone());
            Ok(Some(record))
        })
    }

    fn delete_by_id(&self, id: &str) -> StoreResult<()> {
        self.write(|c| {
            c.remove(id);
            Ok(())
        })
    }

    fn count(&self) -> StoreResult<usize> {
        self.read(|c| Ok(c.len()))
    }

    fn close(&self) -> StoreResult<()> {
        let mut guard = self.inner.write().map_err(|_| StoreError::poisoned())?;
        guard.take();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(nis: &str, email: &str) -> NewStudent {
        NewStudent {
            name: "A".to_string(),
            registration_number: nis.to_string(),
            email: email.to_string(),
            class_label: "X-1".to_string(),
            major: "SIJA".to_string(),
        }
    }

    #[test]
    fn test_create_get_delete() {
        let store = MemoryStore::new();
        let created = store.create(student("001", "a@x.com")).unwrap();

        assert_eq!(store.get_by_id(&created.id).unwrap(), Some(created.clone()));
        store.delete_by_id(&created.id).unwrap();
        assert_eq!(store.get_by_id(&created.id).unwrap(), None);

        // idempotent
        store.delete_by_id(&created.id).unwrap();
    }

    #[test]
    fn test_store_level_unique_constraint() {
        let store = MemoryStore::new();
        store.create(student("001", "a@x.com")).unwrap();

        let err = store.create(student("001", "b@x.com")).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_closed_store_is_unavailable() {
        let store = MemoryStore::new();
        store.close().unwrap();
        store.close().unwrap();

        assert!(matches!(store.list_all(), Err(StoreError::Unavailable(_))));
        assert!(matches!(
            store.create(student("001", "a@x.com")),
            Err(StoreError::Unavailable(_))
        ));
    }
}
