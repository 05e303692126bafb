//! Process-local eviction lock
//!
//! Guarantees at most one capacity sweep per cache directory at a time within
//! this process. Acquisition is a single compare-and-insert on a concurrent
//! map keyed by the directory's canonical path: it either succeeds at once or
//! reports the current holder, and never waits. Release happens when the
//! returned [`EvictionGuard`] drops, so every exit path of a sweep (including
//! errors and panics) frees the directory.
//!
//! There is no cross-process coordination. A sweep skipped because another
//! caller holds the lock is made up by the next write's sweep attempt.

use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tracing::debug;

static GLOBAL_LOCK: Lazy<Arc<EvictionLock>> = Lazy::new(|| Arc::new(EvictionLock::new()));

/// Identity of the caller currently sweeping a directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockToken {
    /// Per-lock-table holder id, unique for the life of the table
    pub holder_id: u64,
    /// When the lock was taken
    pub acquired_at: DateTime<Utc>,
}

/// Result of a non-blocking acquisition attempt
#[derive(Debug)]
pub enum LockStatus {
    /// The caller now holds the lock until the guard drops
    Acquired(EvictionGuard),
    /// Another caller is sweeping this directory
    Busy { holder: LockToken },
}

impl LockStatus {
    /// Check if the lock was acquired
    pub fn is_acquired(&self) -> bool {
        matches!(self, LockStatus::Acquired(_))
    }
}

/// Table of directories currently being swept
#[derive(Debug)]
pub struct EvictionLock {
    holders: DashMap<PathBuf, LockToken>,
    next_holder_id: AtomicU64,
}

impl EvictionLock {
    /// Create an independent lock table
    pub fn new() -> Self {
        Self {
            holders: DashMap::new(),
            next_holder_id: AtomicU64::new(1),
        }
    }

    /// The process-wide lock table shared by default cache stores
    pub fn global() -> Arc<EvictionLock> {
        Arc::clone(&GLOBAL_LOCK)
    }

    /// Try to take the lock for `dir` without waiting
    pub async fn try_acquire(self: &Arc<Self>, dir: &Path) -> LockStatus {
        let key = directory_key(dir).await;
        self.try_acquire_key(key)
    }

    /// Try to take the lock for an already canonical directory key
    pub fn try_acquire_key(self: &Arc<Self>, key: PathBuf) -> LockStatus {
        match self.holders.entry(key.clone()) {
            Entry::Occupied(existing) => {
                let holder = existing.get().clone();
                debug!(
                    "Eviction lock busy for {} (holder {})",
                    key.display(),
                    holder.holder_id
                );
                LockStatus::Busy { holder }
            }
            Entry::Vacant(slot) => {
                let holder_id = self.next_holder_id.fetch_add(1, Ordering::Relaxed);
                slot.insert(LockToken {
                    holder_id,
                    acquired_at: Utc::now(),
                });
                debug!("Eviction lock acquired for {} (holder {})", key.display(), holder_id);
                LockStatus::Acquired(EvictionGuard {
                    lock: Arc::clone(self),
                    key,
                    holder_id,
                })
            }
        }
    }

    /// Check if a directory is currently locked
    pub async fn is_locked(&self, dir: &Path) -> bool {
        let key = directory_key(dir).await;
        self.holders.contains_key(&key)
    }

    /// Get the current holder for a directory, if any
    pub async fn holder(&self, dir: &Path) -> Option<LockToken> {
        let key = directory_key(dir).await;
        self.holders.get(&key).map(|entry| entry.value().clone())
    }

    /// Number of directories currently locked
    pub fn active_count(&self) -> usize {
        self.holders.len()
    }

    fn release(&self, key: &Path, holder_id: u64) {
        if self
            .holders
            .remove_if(key, |_, token| token.holder_id == holder_id)
            .is_some()
        {
            debug!("Eviction lock released for {} (holder {})", key.display(), holder_id);
        }
    }
}

impl Default for EvictionLock {
    fn default() -> Self {
        Self::new()
    }
}

/// Scoped ownership of a directory's eviction lock
#[derive(Debug)]
pub struct EvictionGuard {
    lock: Arc<EvictionLock>,
    key: PathBuf,
    holder_id: u64,
}

impl EvictionGuard {
    /// Canonical directory key this guard holds
    pub fn key(&self) -> &Path {
        &self.key
    }

    /// Holder id recorded in the lock table
    pub fn holder_id(&self) -> u64 {
        self.holder_id
    }
}

impl Drop for EvictionGuard {
    fn drop(&mut self) {
        self.lock.release(&self.key, self.holder_id);
    }
}

/// Canonical identity of a cache directory
///
/// Existing directories are canonicalized so different relative spellings
/// and symlinks contend for the same lock. A directory that does not exist
/// yet falls back to its absolute, lexically normalized path.
pub async fn directory_key(dir: &Path) -> PathBuf {
    match tokio::fs::canonicalize(dir).await {
        Ok(path) => path,
        Err(_) => {
            let absolute = if dir.is_absolute() {
                dir.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(dir))
                    .unwrap_or_else(|_| dir.to_path_buf())
            };
            normalize_lexically(&absolute)
        }
    }
}

fn normalize_lexically(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
