//! File Store Durability Tests
//!
//! - Acknowledged writes survive close and reopen
//! - Deletes and updates replay in order
//! - Damaged logs are refused at open, never silently skipped
//! - Compaction preserves content and ordering

use std::fs;
use std::sync::Arc;

use chrono::Utc;
use student_records::model::{NewStudent, StudentPatch, StudentRecord, UniqueField};
use student_records::store::{
    self, FileStore, LogRecord, LogWriter, StoreError, StudentStore, LOG_FILE_NAME,
};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn student(name: &str, nis: &str, email: &str) -> NewStudent {
    NewStudent {
        name: name.to_string(),
        registration_number: nis.to_string(),
        email: email.to_string(),
        class_label: "X-1".to_string(),
        major: "TKJ".to_string(),
    }
}

fn create_temp_data_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

// =============================================================================
// Persistence
// =============================================================================

#[test]
fn test_records_survive_reopen() {
    let temp_dir = create_temp_data_dir();

    let (a, b) = {
        let store = FileStore::open(temp_dir.path()).unwrap();
        let a = store.create(student("A", "001", "a@x.com")).unwrap();
        let b = store.create(student("B", "002", "b@x.com")).unwrap();
        store.close().unwrap();
        (a, b)
    };

    let store = FileStore::open(temp_dir.path()).unwrap();
    assert_eq!(store.get_by_id(&a.id).unwrap(), Some(a.clone()));
    assert_eq!(store.get_by_id(&b.id).unwrap(), Some(b.clone()));
    assert_eq!(store.list_all().unwrap(), vec![b, a]);
}

#[test]
fn test_updates_and_deletes_replay() {
    let temp_dir = create_temp_data_dir();

    let (kept_id, deleted_id) = {
        let store = FileStore::open(temp_dir.path()).unwrap();
        let a = store.create(student("A", "001", "a@x.com")).unwrap();
        let b = store.create(student("B", "002", "b@x.com")).unwrap();

        let patch = StudentPatch {
            email: Some("a2@x.com".to_string()),
            ..Default::default()
        };
        store.update_by_id(&a.id, patch).unwrap();
        store.delete_by_id(&b.id).unwrap();
        (a.id, b.id)
    };

    let store = FileStore::open(temp_dir.path()).unwrap();
    assert_eq!(store.count().unwrap(), 1);
    assert!(store.get_by_id(&deleted_id).unwrap().is_none());

    let kept = store.get_by_id(&kept_id).unwrap().unwrap();
    assert_eq!(kept.email, "a2@x.com");

    // unique indexes are rebuilt from the log
    assert!(store
        .find_by_field(UniqueField::Email, "a@x.com", None)
        .unwrap()
        .is_none());
    assert!(store
        .find_by_field(UniqueField::Email, "a2@x.com", None)
        .unwrap()
        .is_some());
    assert!(store
        .find_by_field(UniqueField::RegistrationNumber, "002", None)
        .unwrap()
        .is_none());
    assert!(store.create(student("C", "001", "c@x.com")).unwrap_err().is_validation());
}

#[test]
fn test_open_by_connection_string() {
    let temp_dir = create_temp_data_dir();
    let dir = temp_dir.path().join("records");

    let uri = format!("file://{}", dir.display());
    let store: Arc<dyn StudentStore> = store::open(&uri).unwrap();
    store.create(student("A", "001", "a@x.com")).unwrap();
    store.close().unwrap();

    // a bare path names the same directory
    let reopened = store::open(dir.to_str().unwrap()).unwrap();
    assert_eq!(reopened.count().unwrap(), 1);
}

// =============================================================================
// Corruption
// =============================================================================

#[test]
fn test_flipped_byte_refuses_open() {
    let temp_dir = create_temp_data_dir();
    let log_path = temp_dir.path().join(LOG_FILE_NAME);

    {
        let store = FileStore::open(temp_dir.path()).unwrap();
        store.create(student("A", "001", "a@x.com")).unwrap();
    }

    // inside the JSON body, away from the length prefix and checksum
    {
        let mut contents = fs::read(&log_path).unwrap();
        let pos = contents.len() - 10;
        contents[pos] ^= 0xFF;
        fs::write(&log_path, contents).unwrap();
    }

    let result = FileStore::open(temp_dir.path());
    let err = match result {
        Ok(_) => panic!("corrupted log must not open"),
        Err(e) => e,
    };
    assert!(matches!(err, StoreError::Corrupted { offset: 0, .. }));
    assert!(
        err.to_string().to_lowercase().contains("checksum"),
        "error should mention checksum, got: {}",
        err
    );
}

#[test]
fn test_truncated_tail_refuses_open() {
    let temp_dir = create_temp_data_dir();
    let log_path = temp_dir.path().join(LOG_FILE_NAME);

    let first_record_len = {
        let store = FileStore::open(temp_dir.path()).unwrap();
        store.create(student("A", "001", "a@x.com")).unwrap();
        let len = fs::metadata(&log_path).unwrap().len();
        store.create(student("B", "002", "b@x.com")).unwrap();
        len
    };

    let contents = fs::read(&log_path).unwrap();
    fs::write(&log_path, &contents[..contents.len() - 3]).unwrap();

    match FileStore::open(temp_dir.path()) {
        Ok(_) => panic!("truncated log must not open"),
        Err(StoreError::Corrupted { offset, .. }) => assert_eq!(offset, first_record_len),
        Err(other) => panic!("expected corruption, got: {}", other),
    }
}

/// Two live records sharing a registration number must never both load.
#[test]
fn test_duplicate_registration_number_in_log_refuses_open() {
    let temp_dir = create_temp_data_dir();
    let log_path = temp_dir.path().join(LOG_FILE_NAME);

    let second_offset = {
        let now = Utc::now();
        let a = StudentRecord::from_new("a".to_string(), student("A", "001", "a@x.com"), now);
        let b = StudentRecord::from_new("b".to_string(), student("B", "001", "b@x.com"), now);

        let mut writer = LogWriter::open(&log_path).unwrap();
        writer.append(&LogRecord::put(0, &a).unwrap()).unwrap();
        writer.append(&LogRecord::put(1, &b).unwrap()).unwrap()
    };

    match FileStore::open(temp_dir.path()) {
        Ok(store) => panic!(
            "duplicate log must not open, loaded {} records",
            store.count().unwrap()
        ),
        Err(StoreError::Corrupted { offset, reason }) => {
            assert_eq!(offset, second_offset);
            assert!(reason.contains("registrationNumber"), "got: {}", reason);
        }
        Err(other) => panic!("expected corruption, got: {}", other),
    }
}

/// A record may replace its own values, and a deleted record frees them.
#[test]
fn test_replay_allows_reuse_after_delete() {
    let temp_dir = create_temp_data_dir();
    let log_path = temp_dir.path().join(LOG_FILE_NAME);

    {
        let now = Utc::now();
        let a = StudentRecord::from_new("a".to_string(), student("A", "001", "a@x.com"), now);
        let b = StudentRecord::from_new("b".to_string(), student("B", "001", "b@x.com"), now);

        let mut writer = LogWriter::open(&log_path).unwrap();
        writer.append(&LogRecord::put(0, &a).unwrap()).unwrap();
        writer.append(&LogRecord::put(0, &a).unwrap()).unwrap();
        writer.append(&LogRecord::delete(0, "a")).unwrap();
        writer.append(&LogRecord::put(1, &b).unwrap()).unwrap();
    }

    let store = FileStore::open(temp_dir.path()).unwrap();
    let holder = store
        .find_by_field(UniqueField::RegistrationNumber, "001", None)
        .unwrap()
        .unwrap();
    assert_eq!(holder.id, "b");
    assert_eq!(store.count().unwrap(), 1);
}

// =============================================================================
// Compaction
// =============================================================================

#[test]
fn test_compaction_preserves_records_and_order() {
    let temp_dir = create_temp_data_dir();

    let before = {
        let store = FileStore::open(temp_dir.path()).unwrap();
        let a = store.create(student("A", "001", "a@x.com")).unwrap();
        let b = store.create(student("B", "002", "b@x.com")).unwrap();
        store.create(student("C", "003", "c@x.com")).unwrap();

        let patch = StudentPatch {
            name: Some("A renamed".to_string()),
            ..Default::default()
        };
        store.update_by_id(&a.id, patch).unwrap();
        store.delete_by_id(&b.id).unwrap();

        let before = store.list_all().unwrap();
        let stats = store.compact().unwrap();
        assert_eq!(stats.records, 2);
        assert!(stats.bytes_after < stats.bytes_before);
        assert_eq!(store.list_all().unwrap(), before);
        before
    };

    let store = FileStore::open(temp_dir.path()).unwrap();
    assert_eq!(store.list_all().unwrap(), before);
    assert!(!temp_dir
        .path()
        .join(format!("{}.compact", LOG_FILE_NAME))
        .exists());
}
