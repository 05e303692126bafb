//! Integration tests for the cache module
//!
//! These tests drive the cache components together: writes racing sweeps,
//! abandoned temp files, and several stores sharing one lock table.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use crate::app::cache::{
    CacheStore, CapacityEnforcer, DirectoryScanner, EvictionLock, KeyMapper, LockStatus,
    SweepOutcome,
};
use crate::constants::files;

/// Backdate an entry so FIFO order does not depend on timestamp granularity
fn backdate(path: &Path, age_secs: u64) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() - Duration::from_secs(age_secs))
        .unwrap();
}

fn entry_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = DirectoryScanner::scan_entries_blocking(dir)
        .into_iter()
        .map(|c| c.file_name)
        .collect();
    names.sort();
    names
}

/// Test that the store evicts oldest-first across several puts
#[tokio::test]
async fn test_put_sequence_keeps_newest_entries() {
    let temp_dir = TempDir::new().unwrap();
    let store = CacheStore::with_lock(Arc::new(EvictionLock::new()));

    for (i, age) in [(0, 400), (1, 300), (2, 200)] {
        let path = store
            .put(temp_dir.path(), &format!("key-{}", i), &[0u8; 10], 1_000, None)
            .await
            .unwrap();
        backdate(&path, age);
    }

    // Budget 25 keeps two 10-byte entries; key-0 is the oldest
    let outcome = store
        .enforce_capacity(temp_dir.path(), 25)
        .await
        .unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.removed_count(), 1);
    assert_eq!(report.bytes_after, 20);

    assert!(store.get(temp_dir.path(), "key-0", None).await.is_none());
    assert!(store.get(temp_dir.path(), "key-1", None).await.is_some());
    assert!(store.get(temp_dir.path(), "key-2", None).await.is_some());
}

/// Test that abandoned temp files are invisible to sweeps and stats
#[tokio::test]
async fn test_abandoned_temp_files_are_ignored_then_cleaned() {
    let temp_dir = TempDir::new().unwrap();
    let store = CacheStore::with_lock(Arc::new(EvictionLock::new()));

    let abandoned = temp_dir.path().join(format!(
        "{}{}.1.0.dead",
        files::TEMP_FILE_PREFIX,
        KeyMapper::file_name("crashed", "bin")
    ));
    std::fs::write(&abandoned, vec![0u8; 500]).unwrap();
    backdate(&abandoned, 7_200);

    store
        .put(temp_dir.path(), "live", b"0123456789", 20, None)
        .await
        .unwrap();

    // The 500-byte temp file is neither counted nor evicted
    let stats = store.stats(temp_dir.path()).await;
    assert_eq!(stats.entry_count, 1);
    assert_eq!(stats.total_size, 10);
    assert_eq!(stats.reserved_count, 1);
    assert!(abandoned.exists());

    let removed = store
        .clean_temp_files(temp_dir.path(), Duration::from_secs(3_600))
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(!abandoned.exists());
    assert!(store.get(temp_dir.path(), "live", None).await.is_some());
}

/// Test that stores sharing a lock table skip while one sweep is running
#[tokio::test]
async fn test_stores_sharing_lock_table() {
    let temp_dir = TempDir::new().unwrap();
    let lock = Arc::new(EvictionLock::new());
    let first = CacheStore::with_lock(lock.clone());
    let second = CacheStore::with_lock(lock.clone());

    let guard = lock.try_acquire(temp_dir.path()).await;
    assert!(guard.is_acquired());

    assert!(matches!(
        first.enforce_capacity(temp_dir.path(), 1).await.unwrap(),
        SweepOutcome::Skipped { .. }
    ));
    assert!(matches!(
        second.enforce_capacity(temp_dir.path(), 1).await.unwrap(),
        SweepOutcome::Skipped { .. }
    ));

    drop(guard);
    assert!(second
        .enforce_capacity(temp_dir.path(), 1)
        .await
        .unwrap()
        .is_completed());
    assert_eq!(lock.active_count(), 0);
}

/// Test that writes landing during a sweep are never lost as partial files
#[tokio::test]
async fn test_writes_racing_sweeps_leave_complete_entries() {
    let temp_dir = TempDir::new().unwrap();
    let store = CacheStore::with_lock(Arc::new(EvictionLock::new()));
    let payload = vec![7u8; 64];

    let mut handles = Vec::new();
    for i in 0..20 {
        let store = store.clone();
        let dir = temp_dir.path().to_path_buf();
        let payload = payload.clone();
        handles.push(tokio::spawn(async move {
            store
                .put(&dir, &format!("racer-{}", i), &payload, 64 * 5, None)
                .await
                .unwrap();
        }));
    }
    for handle in futures::future::join_all(handles).await {
        handle.unwrap();
    }

    // Every surviving entry is complete; at most the budget's worth remains
    // after a final uncontended sweep.
    store
        .enforce_capacity(temp_dir.path(), 64 * 5)
        .await
        .unwrap();
    let entries = DirectoryScanner::scan_entries_blocking(temp_dir.path());
    assert!(entries.len() <= 5);
    assert!(entries.iter().all(|c| c.size == 64));
    assert!(DirectoryScanner::scan_reserved_blocking(temp_dir.path()).is_empty());
}

/// Test that a sweep leaves subdirectories alone
#[tokio::test]
async fn test_sweep_ignores_subdirectories() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("nested");
    std::fs::create_dir(&nested).unwrap();
    std::fs::write(nested.join("inner.bin"), vec![0u8; 100]).unwrap();
    std::fs::write(temp_dir.path().join("a.bin"), vec![0u8; 10]).unwrap();

    let lock = Arc::new(EvictionLock::new());
    let LockStatus::Acquired(guard) = lock.try_acquire(temp_dir.path()).await else {
        panic!("expected to acquire an idle lock");
    };

    let report = CapacityEnforcer::enforce(guard, temp_dir.path(), 5).await;
    assert_eq!(report.entries_scanned, 1);
    assert_eq!(report.removed_count(), 1);
    assert!(nested.join("inner.bin").exists());
    assert!(entry_names(temp_dir.path()).is_empty());
}

/// Test that a held guard is visible through the global table key
#[tokio::test]
async fn test_guard_key_matches_directory_spelling() {
    let temp_dir = TempDir::new().unwrap();
    let lock = Arc::new(EvictionLock::new());
    let dotted = temp_dir.path().join(".");

    let status = lock.try_acquire(&dotted).await;
    let LockStatus::Acquired(guard) = status else {
        panic!("expected to acquire an idle lock");
    };

    assert!(lock.is_locked(temp_dir.path()).await);
    assert_eq!(
        lock.holder(temp_dir.path()).await.map(|t| t.holder_id),
        Some(guard.holder_id())
    );
}
