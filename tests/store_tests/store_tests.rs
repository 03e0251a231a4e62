//! Tests for Store
//!
//! These tests verify:
//! - Basic set/get/delete/list_keys
//! - Persistence and last-write-wins across restarts
//! - Deletes shadowing older records after replay
//! - Lazy expiry
//! - Checksum verification on read, before and after a restart
//! - Key/value validation and lifecycle errors
//! - Recovery from a torn tail
//! - Concurrent access through Arc<Store>

use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use caskkv::format::HEADER_SIZE;
use caskkv::{CaskError, Config, RecoveryMode, Store, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_temp_store() -> (TempDir, Store) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path().join("store.db")).unwrap();
    (temp_dir, store)
}

fn reopen(temp_dir: &TempDir) -> Store {
    Store::open_path(temp_dir.path().join("store.db")).unwrap()
}

/// Overwrite one byte of the data file in place
fn overwrite_byte(temp_dir: &TempDir, offset: u64, byte: u8) {
    let mut file = OpenOptions::new()
        .write(true)
        .open(temp_dir.path().join("store.db"))
        .unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(&[byte]).unwrap();
}

fn sorted(mut keys: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    keys.sort();
    keys
}

// =============================================================================
// Basic Operations
// =============================================================================

#[test]
fn test_set_get_delete_list() {
    let (_temp, store) = setup_temp_store();

    store.set(b"othello", "shakespeare").unwrap();
    assert_eq!(store.get(b"othello").unwrap(), Value::from("shakespeare"));

    store.set(b"dune", "frank herbert").unwrap();
    assert_eq!(
        sorted(store.list_keys()),
        vec![b"dune".to_vec(), b"othello".to_vec()]
    );

    store.delete(b"othello").unwrap();
    assert!(matches!(store.get(b"othello"), Err(CaskError::KeyNotFound)));
    assert_eq!(store.list_keys(), vec![b"dune".to_vec()]);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_get_missing_key() {
    let (_temp, store) = setup_temp_store();

    assert!(store.is_empty());
    assert!(matches!(store.get(b"nothing"), Err(CaskError::KeyNotFound)));
}

#[test]
fn test_overwrite_returns_latest() {
    let (_temp, store) = setup_temp_store();

    store.set(b"key", "first").unwrap();
    store.set(b"key", "second").unwrap();
    store.set(b"key", "third").unwrap();

    assert_eq!(store.get(b"key").unwrap(), Value::from("third"));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_delete_absent_key_is_noop() {
    let (_temp, store) = setup_temp_store();
    store.set(b"present", "yes").unwrap();
    let position = store.write_position();

    store.delete(b"absent").unwrap();
    store.delete(b"present").unwrap();
    let after_delete = store.write_position();
    store.delete(b"present").unwrap();

    assert_eq!(
        after_delete - position,
        (HEADER_SIZE + b"present".len()) as u64
    );
    assert_eq!(store.write_position(), after_delete);
}

#[test]
fn test_typed_values_roundtrip() {
    let (temp, store) = setup_temp_store();

    store.set(b"bytes", vec![0u8, 1, 2, 255]).unwrap();
    store.set(b"char", 'λ').unwrap();
    store.set(b"bool", true).unwrap();
    store.set(b"i64", -42i64).unwrap();
    store.set(b"u16", 65_535u16).unwrap();
    store.set(b"f64", 2.5f64).unwrap();
    store.close().unwrap();

    let store = reopen(&temp);
    assert_eq!(store.get(b"bytes").unwrap(), Value::Bytes(vec![0, 1, 2, 255]));
    assert_eq!(store.get(b"char").unwrap(), Value::Char('λ'));
    assert_eq!(store.get(b"bool").unwrap(), Value::Bool(true));
    assert_eq!(store.get(b"i64").unwrap(), Value::I64(-42));
    assert_eq!(store.get(b"u16").unwrap(), Value::U16(65_535));
    assert_eq!(store.get(b"f64").unwrap(), Value::F64(2.5));
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_persistence_across_reopen() {
    let (temp, store) = setup_temp_store();

    for i in 0..200 {
        store
            .set(format!("key{:04}", i).as_bytes(), format!("value{}", i))
            .unwrap();
    }
    store.close().unwrap();

    let store = reopen(&temp);
    assert_eq!(store.len(), 200);
    assert_eq!(store.recovery().records_replayed, 200);
    for i in 0..200 {
        assert_eq!(
            store.get(format!("key{:04}", i).as_bytes()).unwrap(),
            Value::from(format!("value{}", i))
        );
    }
}

#[test]
fn test_last_write_wins_after_reopen() {
    let (temp, store) = setup_temp_store();
    store.set(b"hamlet", "draft").unwrap();
    store.set(b"hamlet", "final").unwrap();
    store.close().unwrap();

    let store = reopen(&temp);
    assert_eq!(store.get(b"hamlet").unwrap(), Value::from("final"));
}

#[test]
fn test_delete_survives_restart() {
    let (temp, store) = setup_temp_store();
    store.set(b"othello", "shakespeare").unwrap();
    store.set(b"dune", "frank herbert").unwrap();
    store.delete(b"othello").unwrap();
    store.close().unwrap();

    let store = reopen(&temp);
    assert!(matches!(store.get(b"othello"), Err(CaskError::KeyNotFound)));
    assert_eq!(store.get(b"dune").unwrap(), Value::from("frank herbert"));
    assert_eq!(store.list_keys(), vec![b"dune".to_vec()]);
    assert_eq!(store.recovery().tombstones, 1);

    // A key can come back after being deleted
    store.set(b"othello", "again").unwrap();
    store.close().unwrap();

    let store = reopen(&temp);
    assert_eq!(store.get(b"othello").unwrap(), Value::from("again"));
}

#[test]
fn test_torn_tail_is_dropped_and_writes_continue() {
    let (temp, store) = setup_temp_store();
    store.set(b"k1", "v1").unwrap();
    let good_len = store.write_position();
    store.close().unwrap();

    {
        let mut file = OpenOptions::new()
            .append(true)
            .open(temp.path().join("store.db"))
            .unwrap();
        file.write_all(&[0xAB; 10]).unwrap();
    }

    let store = reopen(&temp);
    assert!(store.recovery().was_truncated);
    assert_eq!(store.recovery().discarded_bytes, 10);
    assert_eq!(store.write_position(), good_len);

    store.set(b"k2", "v2").unwrap();
    store.close().unwrap();

    let store = reopen(&temp);
    assert!(!store.recovery().was_truncated);
    assert_eq!(store.get(b"k1").unwrap(), Value::from("v1"));
    assert_eq!(store.get(b"k2").unwrap(), Value::from("v2"));
}

#[test]
fn test_strict_mode_refuses_torn_tail() {
    let (temp, store) = setup_temp_store();
    store.set(b"k1", "v1").unwrap();
    store.close().unwrap();

    let path = temp.path().join("store.db");
    {
        let mut file = OpenOptions::new().append(true).open(&path).unwrap();
        file.write_all(&[0xAB; 10]).unwrap();
    }

    let config = Config::builder()
        .path(&path)
        .recovery_mode(RecoveryMode::Strict)
        .build();
    assert!(matches!(Store::open(config), Err(CaskError::CorruptLog { .. })));
}

// =============================================================================
// Expiry Tests
// =============================================================================

#[test]
fn test_expired_key_reads_as_absent() {
    let (_temp, store) = setup_temp_store();

    store
        .set_with_expiry(b"session", "token", Duration::from_secs(1))
        .unwrap();
    store.set(b"forever", "stays").unwrap();

    assert_eq!(store.get(b"session").unwrap(), Value::from("token"));
    assert_eq!(store.len(), 2);

    thread::sleep(Duration::from_millis(2500));

    assert!(matches!(store.get(b"session"), Err(CaskError::KeyNotFound)));
    assert_eq!(store.list_keys(), vec![b"forever".to_vec()]);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_overwrite_clears_expiry() {
    let (_temp, store) = setup_temp_store();

    store
        .set_with_expiry(b"key", "short", Duration::from_secs(1))
        .unwrap();
    store.set(b"key", "long").unwrap();

    thread::sleep(Duration::from_millis(2500));

    assert_eq!(store.get(b"key").unwrap(), Value::from("long"));
}

// =============================================================================
// Integrity Tests
// =============================================================================

#[test]
fn test_corrupted_value_fails_checksum() {
    let (temp, store) = setup_temp_store();
    store.set(b"key", "value").unwrap();

    overwrite_byte(&temp, (HEADER_SIZE + b"key".len()) as u64, b'V');

    assert!(matches!(
        store.get(b"key"),
        Err(CaskError::ChecksumMismatch { .. })
    ));
    store.close().unwrap();

    // Still reported after replay, not hidden as a missing key
    let store = reopen(&temp);
    assert_eq!(store.recovery().corrupt_records, 1);
    assert!(matches!(
        store.get(b"key"),
        Err(CaskError::ChecksumMismatch { .. })
    ));
}

#[test]
fn test_corrupt_middle_record_keeps_later_records() {
    let (temp, store) = setup_temp_store();
    store.set(b"a", "one").unwrap();
    let b_offset = store.write_position();
    store.set(b"b", "two").unwrap();
    store.set(b"c", "three").unwrap();
    let len = store.write_position();
    store.close().unwrap();

    overwrite_byte(&temp, b_offset + (HEADER_SIZE + b"b".len()) as u64, b'T');

    let store = reopen(&temp);
    assert!(!store.recovery().was_truncated);
    assert_eq!(store.write_position(), len);

    assert_eq!(store.get(b"a").unwrap(), Value::from("one"));
    assert!(matches!(
        store.get(b"b"),
        Err(CaskError::ChecksumMismatch { .. })
    ));
    assert_eq!(store.get(b"c").unwrap(), Value::from("three"));

    // Overwriting the damaged key makes it readable again
    store.set(b"b", "fixed").unwrap();
    assert_eq!(store.get(b"b").unwrap(), Value::from("fixed"));
}

#[test]
fn test_scan_continues_past_corrupt_record() {
    let (temp, store) = setup_temp_store();
    store.set(b"a", "one").unwrap();
    let b_offset = store.write_position();
    store.set(b"b", "two").unwrap();
    store.set(b"c", "three").unwrap();

    overwrite_byte(&temp, b_offset + (HEADER_SIZE + b"b".len()) as u64, b'T');

    let items: Vec<_> = store.scan().unwrap().collect();

    assert_eq!(items.len(), 3);
    assert!(matches!(&items[1], Err(CaskError::CorruptRecord { offset, .. }) if *offset == b_offset));
    assert_eq!(
        items[2].as_ref().unwrap().record.value().unwrap(),
        Value::from("three")
    );
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_empty_key_rejected() {
    let (_temp, store) = setup_temp_store();

    assert!(matches!(store.set(b"", "value"), Err(CaskError::EmptyKey)));
    assert!(matches!(store.delete(b""), Err(CaskError::EmptyKey)));
    assert_eq!(store.write_position(), 0);
}

#[test]
fn test_size_limits() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp.path().join("store.db"))
        .max_key_size(4)
        .max_value_size(8)
        .build();
    let store = Store::open(config).unwrap();

    assert!(matches!(
        store.set(b"toolong", "v"),
        Err(CaskError::KeyTooLarge { size: 7, max: 4 })
    ));
    assert!(matches!(
        store.set(b"key", "123456789"),
        Err(CaskError::ValueTooLarge { size: 9, max: 8 })
    ));
    assert_eq!(store.write_position(), 0);

    store.set(b"key", "12345678").unwrap();
    store.set(b"k", 7u64).unwrap();
}

#[test]
fn test_invalid_config_rejected() {
    let temp = TempDir::new().unwrap();
    let config = Config::builder()
        .path(temp.path().join("store.db"))
        .max_key_size(0)
        .build();

    assert!(matches!(Store::open(config), Err(CaskError::Config(_))));
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_operations_after_close() {
    let (_temp, store) = setup_temp_store();
    store.set(b"key", "value").unwrap();
    store.close().unwrap();

    assert!(matches!(store.get(b"key"), Err(CaskError::Closed)));
    assert!(matches!(store.set(b"key", "v"), Err(CaskError::Closed)));
    assert!(matches!(store.delete(b"key"), Err(CaskError::Closed)));
    assert!(matches!(store.scan(), Err(CaskError::Closed)));
    assert!(store.list_keys().is_empty());
    assert!(matches!(store.close(), Err(CaskError::Closed)));
}

#[test]
fn test_scan_yields_every_record() {
    let (_temp, store) = setup_temp_store();
    store.set(b"a", "1").unwrap();
    store.set(b"b", "2").unwrap();
    store.delete(b"a").unwrap();

    let entries: Vec<_> = store.scan().unwrap().collect::<Result<_, _>>().unwrap();

    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].offset, 0);
    assert_eq!(entries[1].record.value().unwrap(), Value::from("2"));
    assert!(entries[2].record.is_tombstone());
    assert_eq!(entries[2].record.key, b"a".to_vec());
}

#[test]
fn test_lock_file_blocks_second_store() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("store.db");
    let config = Config::builder().path(&path).lock_file(true).build();

    let store = Store::open(config.clone()).unwrap();
    assert!(matches!(Store::open(config.clone()), Err(CaskError::Locked(_))));

    store.close().unwrap();
    let store = Store::open(config).unwrap();
    store.close().unwrap();
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_concurrent_writers_and_readers() {
    let (_temp, store) = setup_temp_store();
    let store = Arc::new(store);

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..50 {
                    let key = format!("t{}-k{}", t, i);
                    store.set(key.as_bytes(), i as u64).unwrap();
                    assert_eq!(store.get(key.as_bytes()).unwrap(), Value::U64(i as u64));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.len(), 200);
    assert_eq!(store.list_keys().len(), 200);
}
