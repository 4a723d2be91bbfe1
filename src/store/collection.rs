//! Indexed in-memory collection
//!
//! Holds the live records of a store together with the unique indexes on
//! registration number and email. Mutations are split in two steps:
//! `prepare_*` checks constraints and builds the new record without touching
//! state, then `put` / `remove` apply it. Durable backends persist the
//! prepared record between the two steps.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::errors::{StoreError, StoreResult};
use crate::model::{NewStudent, StudentPatch, StudentRecord, UniqueField};

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    record: StudentRecord,
}

/// Live records plus unique indexes
#[derive(Debug, Default)]
pub struct Collection {
    records: HashMap<String, Entry>,
    by_registration_number: HashMap<String, String>,
    by_email: HashMap<String, String>,
    next_seq: u64,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn index(&self, field: UniqueField) -> &HashMap<String, String> {
        match field {
            UniqueField::RegistrationNumber => &self.by_registration_number,
            UniqueField::Email => &self.by_email,
        }
    }

    fn index_mut(&mut self, field: UniqueField) -> &mut HashMap<String, String> {
        match field {
            UniqueField::RegistrationNumber => &mut self.by_registration_number,
            UniqueField::Email => &mut self.by_email,
        }
    }

    /// All records, most recently created first.
    ///
    /// Records created within the same instant are ordered by insertion.
    pub fn list(&self) -> Vec<StudentRecord> {
        let mut entries: Vec<&Entry> = self.records.values().collect();
        entries.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });
        entries.into_iter().map(|e| e.record.clone()).collect()
    }

    /// Records with their sequence numbers, in insertion order
    pub fn entries(&self) -> Vec<(u64, &StudentRecord)> {
        let mut entries: Vec<(u64, &StudentRecord)> =
            self.records.values().map(|e| (e.seq, &e.record)).collect();
        entries.sort_by_key(|(seq, _)| *seq);
        entries
    }

    pub fn get(&self, id: &str) -> Option<&StudentRecord> {
        self.records.get(id).map(|e| &e.record)
    }

    pub fn seq_of(&self, id: &str) -> Option<u64> {
        self.records.get(id).map(|e| e.seq)
    }

    /// Record holding `value` in a unique field, skipping `exclude_id`
    pub fn find(
        &self,
        field: UniqueField,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Option<&StudentRecord> {
        let id = self.index(field).get(value)?;
        if exclude_id == Some(id.as_str()) {
            return None;
        }
        self.get(id)
    }

    /// Fail if any unique value of `record` belongs to a different record
    pub fn check_unique(&self, record: &StudentRecord) -> StoreResult<()> {
        for field in UniqueField::ALL {
            let value = record.unique_value(field);
            if self.find(field, value, Some(&record.id)).is_some() {
                return Err(StoreError::duplicate_key(field, value));
            }
        }
        Ok(())
    }

    /// Build a new record with a fresh id and sequence number.
    pub fn prepare_insert(
        &self,
        student: NewStudent,
        now: DateTime<Utc>,
    ) -> StoreResult<(u64, StudentRecord)> {
        student.validate()?;

        let mut id = Uuid::new_v4().to_string();
        while self.records.contains_key(&id) {
            id = Uuid::new_v4().to_string();
        }

        let record = StudentRecord::from_new(id, student, now);
        self.check_unique(&record)?;
        Ok((self.next_seq, record))
    }

    /// Build the merged record for an update; `None` if `id` is absent.
    pub fn prepare_update(
        &self,
        id: &str,
        patch: StudentPatch,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<(u64, StudentRecord)>> {
        patch.validate()?;

        let Some(entry) = self.records.get(id) else {
            return Ok(None);
        };

        let mut record = entry.record.clone();
        record.apply(patch, now);
        self.check_unique(&record)?;
        Ok(Some((entry.seq, record)))
    }

    /// Insert or replace a record, keeping indexes in step.
    pub fn put(&mut self, seq: u64, record: StudentRecord) {
        self.remove(&record.id);

        for field in UniqueField::ALL {
            let value = record.unique_value(field).to_string();
            let id = record.id.clone();
            self.index_mut(field).insert(value, id);
        }

        self.next_seq = self.next_seq.max(seq + 1);
        self.records
            .insert(record.id.clone(), Entry { seq, record });
    }

    /// Remove a record and its index entries.
    pub fn remove(&mut self, id: &str) -> Option<StudentRecord> {
        let entry = self.records.remove(id)?;
        for field in UniqueField::ALL {
            let value = entry.record.unique_value(field);
            let index = self.index_mut(field);
            if index.get(value).map(String::as_str) == Some(id) {
                index.remove(value);
            }
        }
        Some(entry.record)
    }
}
