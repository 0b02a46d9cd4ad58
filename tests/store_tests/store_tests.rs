//! Tests for AttributeStore
//!
//! These tests verify:
//! - Bootstrap of a fresh medium
//! - get/set round trips, overwrite and fixed-length semantics
//! - Capacity limit
//! - Rollback when the directory cannot be persisted
//! - Persistence across re-opening the store

use std::io;

use gpnvm::storage::{FileMedium, Medium, MemoryMedium};
use gpnvm::{AttributeStore, Config, NvmError, SyncPolicy, CAPACITY, DIRECTORY_RECORD_SIZE};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_memory_store() -> AttributeStore<MemoryMedium> {
    AttributeStore::init(MemoryMedium::new()).unwrap()
}

fn setup_temp_config() -> (TempDir, Config) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .medium_path(temp_dir.path().join("nvm.bin"))
        .sync_policy(SyncPolicy::EveryWrite)
        .build();
    (temp_dir, config)
}

/// Medium with switchable failures, wrapping a MemoryMedium
#[derive(Default)]
struct FlakyMedium {
    inner: MemoryMedium,
    fail_reads: bool,
    fail_appends: bool,
    fail_updates_at: Option<u32>,
}

impl Medium for FlakyMedium {
    fn read(&self, offset: u32, len: usize) -> gpnvm::Result<Vec<u8>> {
        if self.fail_reads {
            return Err(NvmError::Io(io::Error::new(io::ErrorKind::Other, "injected read failure")));
        }
        self.inner.read(offset, len)
    }

    fn update(&mut self, offset: u32, bytes: &[u8]) -> gpnvm::Result<()> {
        if self.fail_updates_at == Some(offset) {
            return Err(NvmError::VerificationFailed {
                offset,
                detail: "injected update failure".to_string(),
            });
        }
        self.inner.update(offset, bytes)
    }

    fn append(&mut self, offset: u32, bytes: &[u8]) -> gpnvm::Result<()> {
        if self.fail_appends {
            return Err(NvmError::ShortWrite {
                offset,
                expected: bytes.len(),
            });
        }
        self.inner.append(offset, bytes)
    }
}

// =============================================================================
// Bootstrap Tests
// =============================================================================

#[test]
fn test_init_fresh_medium_creates_directory() {
    let store = setup_memory_store();

    assert!(store.is_empty());
    assert_eq!(store.directory().len(), 0);
    assert_eq!(store.medium().len(), DIRECTORY_RECORD_SIZE as usize);
    assert!(store.medium().as_bytes().iter().all(|&b| b == 0));

    for id in [0u8, 1, 42, 255] {
        assert!(matches!(store.get_attribute(id), Err(NvmError::AttrNotFound(i)) if i == id));
    }
}

#[test]
fn test_open_creates_medium_file() {
    let (_temp, config) = setup_temp_config();
    assert!(!config.medium_path.exists());

    let store = AttributeStore::open(&config).unwrap();

    assert!(store.is_empty());
    assert_eq!(
        std::fs::metadata(&config.medium_path).unwrap().len(),
        u64::from(DIRECTORY_RECORD_SIZE)
    );
}

#[test]
fn test_open_without_create_if_missing() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder()
        .medium_path(temp_dir.path().join("absent.bin"))
        .create_if_missing(false)
        .build();

    let err = AttributeStore::open(&config).err().unwrap();

    assert!(matches!(err, NvmError::MediumNotFound(_)));
    assert!(!config.medium_path.exists());
}

#[test]
fn test_init_refuses_partial_record() {
    let medium = MemoryMedium::from_bytes(vec![0u8; 20]);

    let err = AttributeStore::init(medium).err().unwrap();

    assert!(matches!(err, NvmError::MemError(_)));
    assert!(matches!(
        err.root_cause(),
        NvmError::ShortRead { offset: 0, actual: 20, .. }
    ));
}

#[test]
fn test_init_read_failure_creates_nothing() {
    let medium = FlakyMedium {
        fail_reads: true,
        ..Default::default()
    };

    let err = AttributeStore::init(medium).err().unwrap();

    assert!(matches!(err.root_cause(), NvmError::Io(_)));
}

#[test]
fn test_init_rejects_corrupt_record() {
    let mut record = vec![0u8; DIRECTORY_RECORD_SIZE as usize];
    record[0] = 200;

    let err = AttributeStore::init(MemoryMedium::from_bytes(record)).err().unwrap();

    assert!(matches!(err, NvmError::MemError(_)));
    assert!(matches!(err.root_cause(), NvmError::CorruptDirectory(_)));
}

#[test]
fn test_failed_reload_keeps_directory() {
    let mut store = AttributeStore::init(FlakyMedium::default()).unwrap();
    store.set_attribute(1, 1, &[1]).unwrap();
    let before = store.directory().clone();

    store.medium_mut().fail_reads = true;
    let err = store.reload().unwrap_err();
    store.medium_mut().fail_reads = false;

    assert!(matches!(err, NvmError::MemError(_)));
    assert_eq!(store.directory(), &before);
    assert_eq!(store.get_attribute(1).unwrap(), (1, vec![1]));

    // New attributes still land after the existing payload
    store.set_attribute(9, 1, &[9]).unwrap();
    assert_eq!(store.get_attribute(1).unwrap(), (1, vec![1]));
    assert_eq!(store.get_attribute(9).unwrap(), (1, vec![9]));
    store.directory().check_invariants().unwrap();
}

#[test]
fn test_corrupt_record_on_reload_keeps_directory() {
    let mut store = setup_memory_store();
    store.set_attribute(2, 2, &[2, 2]).unwrap();

    // Entry count byte of the persisted record
    store.medium_mut().update(0, &[200]).unwrap();
    let err = store.reload().unwrap_err();

    assert!(matches!(err.root_cause(), NvmError::CorruptDirectory(_)));
    assert_eq!(store.get_attribute(2).unwrap(), (2, vec![2, 2]));
}

// =============================================================================
// Get/Set Tests
// =============================================================================

#[test]
fn test_set_get_round_trip() {
    let mut store = setup_memory_store();

    store.set_attribute(1, 4, &0xDEADBEEFu32.to_le_bytes()).unwrap();
    let (length, value) = store.get_attribute(1).unwrap();

    assert_eq!(length, 4);
    assert_eq!(value, 0xDEADBEEFu32.to_le_bytes());
}

#[test]
fn test_round_trip_all_lengths() {
    // Spread lengths 1..=255 over several stores (ten attributes each)
    let lengths: Vec<u8> = (1..=255).collect();

    for chunk in lengths.chunks(CAPACITY) {
        let mut store = setup_memory_store();
        for (i, &length) in chunk.iter().enumerate() {
            let value: Vec<u8> = (0..length).map(|b| b.wrapping_mul(31).wrapping_add(i as u8)).collect();
            store.set_attribute(i as u8, length, &value).unwrap();

            assert_eq!(store.get_attribute(i as u8).unwrap(), (length, value));
        }
        store.directory().check_invariants().unwrap();
    }
}

#[test]
fn test_value_lands_after_directory_record() {
    let mut store = setup_memory_store();

    store.set_attribute(7, 3, &[1, 2, 3]).unwrap();
    store.set_attribute(8, 2, &[4, 5]).unwrap();

    let start = DIRECTORY_RECORD_SIZE as usize;
    assert_eq!(&store.medium().as_bytes()[start..], &[1, 2, 3, 4, 5]);
}

#[test]
fn test_overwrite_same_length() {
    let mut store = setup_memory_store();

    store.set_attribute(3, 2, &[1, 1]).unwrap();
    store.set_attribute(3, 2, &[2, 2]).unwrap();

    assert_eq!(store.get_attribute(3).unwrap(), (2, vec![2, 2]));
    assert_eq!(store.len(), 1);
    // Overwrite happens in place: medium did not grow
    assert_eq!(store.medium().len(), DIRECTORY_RECORD_SIZE as usize + 2);
}

#[test]
fn test_overwrite_different_length_rejected() {
    let mut store = setup_memory_store();
    store.set_attribute(3, 2, &[1, 1]).unwrap();

    let err = store.set_attribute(3, 3, &[9, 9, 9]).unwrap_err();

    assert!(matches!(
        err,
        NvmError::AttrLenDiff {
            id: 3,
            stored: 2,
            requested: 3
        }
    ));
    assert_eq!(store.get_attribute(3).unwrap(), (2, vec![1, 1]));
}

#[test]
fn test_value_length_mismatch_rejected() {
    let mut store = setup_memory_store();

    let err = store.set_attribute(1, 4, &[1, 2]).unwrap_err();

    assert!(matches!(err, NvmError::ValueLength { declared: 4, actual: 2 }));
    assert!(!store.contains(1));
    assert_eq!(store.medium().len(), DIRECTORY_RECORD_SIZE as usize);
}

#[test]
fn test_ids_stay_unique() {
    let mut store = setup_memory_store();

    for round in 0..3u8 {
        for id in [5u8, 6, 5, 7, 6] {
            store.set_attribute(id, 1, &[round]).unwrap();
        }
    }

    let ids: Vec<u8> = store.attribute_ids().collect();
    assert_eq!(ids, vec![5, 6, 7]);
    store.directory().check_invariants().unwrap();
}

// =============================================================================
// Capacity Tests
// =============================================================================

#[test]
fn test_capacity_boundary() {
    let mut store = setup_memory_store();
    for id in 0..CAPACITY as u8 {
        store.set_attribute(id, 1, &[id]).unwrap();
    }
    let medium_len = store.medium().len();

    let err = store.set_attribute(200, 1, &[0]).unwrap_err();

    assert!(matches!(err, NvmError::MemFull { capacity: CAPACITY }));
    assert!(matches!(store.get_attribute(200), Err(NvmError::AttrNotFound(200))));
    assert_eq!(store.medium().len(), medium_len);

    // Existing attributes can still be overwritten
    store.set_attribute(0, 1, &[99]).unwrap();
    assert_eq!(store.get_attribute(0).unwrap(), (1, vec![99]));
}

// =============================================================================
// Failure Handling Tests
// =============================================================================

#[test]
fn test_persist_failure_rolls_back() {
    let mut store = AttributeStore::init(FlakyMedium::default()).unwrap();
    store.set_attribute(1, 3, &[1, 2, 3]).unwrap();
    let before = store.directory().clone();

    store.medium_mut().fail_updates_at = Some(0);
    let err = store.set_attribute(2, 4, &[4, 4, 4, 4]).unwrap_err();

    assert!(matches!(err, NvmError::MemError(_)));
    assert!(matches!(err.root_cause(), NvmError::VerificationFailed { offset: 0, .. }));
    assert_eq!(store.directory(), &before);
    assert_eq!(store.directory().len(), 1);
    assert_eq!(store.directory().total_payload_size(), 3);
    assert!(matches!(store.get_attribute(2), Err(NvmError::AttrNotFound(2))));

    // The orphaned payload is still on the medium
    assert_eq!(
        store.medium().inner.len(),
        DIRECTORY_RECORD_SIZE as usize + 3 + 4
    );
}

#[test]
fn test_insert_after_rollback_reuses_offset() {
    let mut store = AttributeStore::init(FlakyMedium::default()).unwrap();
    store.set_attribute(1, 3, &[1, 2, 3]).unwrap();

    store.medium_mut().fail_updates_at = Some(0);
    store.set_attribute(2, 4, &[4; 4]).unwrap_err();
    store.medium_mut().fail_updates_at = None;

    store.set_attribute(3, 4, &[9; 4]).unwrap();
    store.set_attribute(5, 1, &[7]).unwrap();

    assert_eq!(store.get_attribute(3).unwrap(), (4, vec![9; 4]));
    assert_eq!(store.get_attribute(5).unwrap(), (1, vec![7]));
    assert!(matches!(store.get_attribute(2), Err(NvmError::AttrNotFound(2))));
    assert_eq!(
        store.directory().lookup(3).unwrap().offset,
        DIRECTORY_RECORD_SIZE + 3
    );
    assert_eq!(
        store.medium().inner.len() as u32,
        store.directory().next_offset()
    );
    store.directory().check_invariants().unwrap();
}

#[test]
fn test_insert_after_rollback_on_file_medium() {
    let (_temp, config) = setup_temp_config();
    let mut store = AttributeStore::open(&config).unwrap();
    store.set_attribute(1, 2, &[1, 1]).unwrap();

    // Orphaned payload, as left behind by a failed directory persist
    store.medium_mut().append(DIRECTORY_RECORD_SIZE + 2, &[0xEE; 5]).unwrap();

    store.set_attribute(2, 3, &[2, 2, 2]).unwrap();
    drop(store);

    let store = AttributeStore::open(&config).unwrap();
    assert_eq!(store.get_attribute(1).unwrap(), (2, vec![1, 1]));
    assert_eq!(store.get_attribute(2).unwrap(), (3, vec![2, 2, 2]));
    assert_eq!(
        std::fs::metadata(&config.medium_path).unwrap().len(),
        u64::from(store.directory().next_offset())
    );
}

#[test]
fn test_rollback_matches_persisted_record() {
    let mut store = AttributeStore::init(FlakyMedium::default()).unwrap();
    store.set_attribute(1, 1, &[1]).unwrap();

    store.medium_mut().fail_updates_at = Some(0);
    store.set_attribute(2, 1, &[2]).unwrap_err();
    store.medium_mut().fail_updates_at = None;

    let in_memory = store.directory().clone();
    store.reload().unwrap();

    assert_eq!(store.directory(), &in_memory);
}

#[test]
fn test_append_failure_leaves_directory_untouched() {
    let mut store = AttributeStore::init(FlakyMedium::default()).unwrap();

    store.medium_mut().fail_appends = true;
    let err = store.set_attribute(1, 2, &[1, 2]).unwrap_err();

    assert!(matches!(err.root_cause(), NvmError::ShortWrite { .. }));
    assert!(store.is_empty());
    assert_eq!(store.medium().inner.len(), DIRECTORY_RECORD_SIZE as usize);
}

#[test]
fn test_overwrite_failure_is_mem_error() {
    let mut store = AttributeStore::init(FlakyMedium::default()).unwrap();
    store.set_attribute(1, 2, &[1, 2]).unwrap();
    let offset = store.directory().lookup(1).unwrap().offset;

    store.medium_mut().fail_updates_at = Some(offset);
    let err = store.set_attribute(1, 2, &[3, 4]).unwrap_err();

    assert!(matches!(err, NvmError::MemError(_)));
    assert!(store.contains(1));
}

#[test]
fn test_read_failure_is_mem_error() {
    let mut store = AttributeStore::init(FlakyMedium::default()).unwrap();
    store.set_attribute(1, 2, &[1, 2]).unwrap();

    store.medium_mut().fail_reads = true;
    let err = store.get_attribute(1).unwrap_err();

    assert!(matches!(err, NvmError::MemError(_)));
    assert!(std::error::Error::source(&err).is_some());
}

// =============================================================================
// Persistence Tests
// =============================================================================

#[test]
fn test_attributes_survive_reopen() {
    let (_temp, config) = setup_temp_config();

    {
        let mut store = AttributeStore::open(&config).unwrap();
        store.set_attribute(1, 1, &[7]).unwrap();
        store.set_attribute(2, 8, &42u64.to_le_bytes()).unwrap();
        store.set_attribute(1, 1, &[8]).unwrap();
    }

    let store = AttributeStore::open(&config).unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.get_attribute(1).unwrap(), (1, vec![8]));
    assert_eq!(store.get_attribute(2).unwrap(), (8, 42u64.to_le_bytes().to_vec()));
    store.directory().check_invariants().unwrap();
}

#[test]
fn test_reload_rereads_medium() {
    let (_temp, config) = setup_temp_config();
    let mut first = AttributeStore::open(&config).unwrap();
    let mut second = AttributeStore::open(&config).unwrap();

    first.set_attribute(9, 2, &[1, 2]).unwrap();
    assert!(!second.contains(9));

    second.reload().unwrap();

    assert_eq!(second.get_attribute(9).unwrap(), (2, vec![1, 2]));
}

#[test]
fn test_init_on_existing_file_medium() {
    let (_temp, config) = setup_temp_config();
    {
        let mut store = AttributeStore::open(&config).unwrap();
        store.set_attribute(4, 2, &[4, 4]).unwrap();
    }

    let medium = FileMedium::new(&config.medium_path, SyncPolicy::OsBuffered);
    let store = AttributeStore::init(medium).unwrap();

    assert_eq!(store.get_attribute(4).unwrap(), (2, vec![4, 4]));
    assert_eq!(store.into_medium().len().unwrap(), u64::from(DIRECTORY_RECORD_SIZE) + 2);
}
