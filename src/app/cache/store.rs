//! Cache store facade
//!
//! `CacheStore` composes key mapping, atomic writes, lookups, and the guarded
//! capacity sweep into the operations collaborators use: `put`, `get`, and
//! `enforce_capacity`. Every operation takes the cache directory explicitly,
//! so one store can serve any number of directories; the only shared state
//! is the eviction lock table.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::fs;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

use super::config::CacheConfig;
use super::eviction::{CapacityEnforcer, DirectoryScanner, SweepReport};
use super::key::validate_extension;
use super::lock::{directory_key, EvictionLock, LockStatus, LockToken};
use super::lookup::Lookup;
use super::stats::CacheStats;
use super::writer::AtomicWriter;

/// Outcome of a capacity enforcement request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SweepOutcome {
    /// This caller ran the sweep
    Completed(SweepReport),
    /// Another caller was already sweeping the directory
    Skipped { holder: LockToken },
}

impl SweepOutcome {
    /// Check if this caller performed the sweep
    pub fn is_completed(&self) -> bool {
        matches!(self, SweepOutcome::Completed(_))
    }

    /// The sweep report, if this caller performed the sweep
    pub fn report(&self) -> Option<&SweepReport> {
        match self {
            SweepOutcome::Completed(report) => Some(report),
            SweepOutcome::Skipped { .. } => None,
        }
    }
}

/// Bounded, directory-backed binary cache
#[derive(Debug, Clone)]
pub struct CacheStore {
    /// Lock table guarding sweeps
    eviction_lock: Arc<EvictionLock>,
    /// Extension used when callers pass `None`
    default_extension: String,
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheStore {
    /// Create a store sharing the process-wide eviction lock
    pub fn new() -> Self {
        Self::with_lock(EvictionLock::global())
    }

    /// Create a store using a specific lock table
    pub fn with_lock(eviction_lock: Arc<EvictionLock>) -> Self {
        Self {
            eviction_lock,
            default_extension: files::DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Create a store from a validated configuration
    pub fn from_config(config: &CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self::new().with_default_extension(config.default_extension.clone()))
    }

    /// Set the extension used when callers pass `None`
    pub fn with_default_extension(mut self, ext: impl Into<String>) -> Self {
        self.default_extension = ext.into();
        self
    }

    /// Get the default extension
    pub fn default_extension(&self) -> &str {
        &self.default_extension
    }

    /// Get the lock table guarding sweeps
    pub fn eviction_lock(&self) -> &Arc<EvictionLock> {
        &self.eviction_lock
    }

    /// Store `data` under `key` and then sweep the directory best-effort
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidBudget` for a zero or negative budget and
    /// `CacheError::InvalidExtension` for an unusable extension, both before
    /// any filesystem access. Write failures are propagated; a failing or
    /// skipped sweep never fails the `put`.
    pub async fn put(
        &self,
        dir: &Path,
        key: &str,
        data: &[u8],
        max_bytes: i64,
        ext: Option<&str>,
    ) -> CacheResult<PathBuf> {
        let budget = validate_budget(max_bytes)?;
        let ext = self.resolve_extension(ext);
        validate_extension(ext)?;

        let path = AtomicWriter::write(dir, key, data, ext).await?;

        match self.sweep(dir, budget).await {
            SweepOutcome::Completed(report) => {
                debug!(
                    "Post-write sweep of {} removed {} entries",
                    dir.display(),
                    report.removed_count()
                );
            }
            SweepOutcome::Skipped { holder } => {
                debug!(
                    "Post-write sweep of {} skipped, holder {} active",
                    dir.display(),
                    holder.holder_id
                );
            }
        }

        Ok(path)
    }

    /// Resolve `key` to an existing entry path
    ///
    /// Absent keys, invalid extensions, and names occupied by something other
    /// than a regular file all return `None`.
    pub async fn get(&self, dir: &Path, key: &str, ext: Option<&str>) -> Option<PathBuf> {
        let ext = self.resolve_extension(ext);
        if let Err(e) = validate_extension(ext) {
            debug!("Lookup with unusable extension treated as miss: {}", e);
            return None;
        }
        Lookup::resolve(dir, key, ext).await
    }

    /// Resolve and read an entry in one step
    ///
    /// An entry removed between resolution and read is a miss.
    pub async fn read(
        &self,
        dir: &Path,
        key: &str,
        ext: Option<&str>,
    ) -> CacheResult<Option<Vec<u8>>> {
        let Some(path) = self.get(dir, key, ext).await else {
            return Ok(None);
        };

        match fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Entry vanished before read: {}", path.display());
                Ok(None)
            }
            Err(source) => Err(CacheError::ReadFailed { path, source }),
        }
    }

    /// Bring the directory under `max_bytes`, unless a sweep is already running
    ///
    /// # Errors
    ///
    /// Returns `CacheError::InvalidBudget` for a zero or negative budget.
    pub async fn enforce_capacity(
        &self,
        dir: &Path,
        max_bytes: i64,
    ) -> CacheResult<SweepOutcome> {
        let budget = validate_budget(max_bytes)?;
        Ok(self.sweep(dir, budget).await)
    }

    async fn sweep(&self, dir: &Path, budget: u64) -> SweepOutcome {
        let key = directory_key(dir).await;
        match self.eviction_lock.try_acquire_key(key) {
            LockStatus::Acquired(guard) => {
                SweepOutcome::Completed(CapacityEnforcer::enforce(guard, dir, budget).await)
            }
            LockStatus::Busy { holder } => SweepOutcome::Skipped { holder },
        }
    }

    /// Summarize the entries in a directory
    pub async fn stats(&self, dir: &Path) -> CacheStats {
        CacheStats::collect(dir).await
    }

    /// Remove temp files older than `max_age` left behind by crashed writers
    ///
    /// Only names with the temp prefix are considered; other reserved files
    /// are never touched.
    pub async fn clean_temp_files(&self, dir: &Path, max_age: Duration) -> CacheResult<usize> {
        let dir = dir.to_path_buf();
        let removed =
            tokio::task::spawn_blocking(move || clean_temp_files_blocking(&dir, max_age))
                .await
                .map_err(|e| CacheError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

        if removed > 0 {
            info!("Removed {} abandoned temporary files", removed);
        }
        Ok(removed)
    }

    /// Run `enforce_capacity` every `interval` until the handle is aborted
    ///
    /// # Errors
    ///
    /// Returns a precondition error for a zero or negative budget or a zero
    /// interval, before anything is spawned.
    pub fn spawn_sweeper(
        &self,
        dir: PathBuf,
        max_bytes: i64,
        interval: Duration,
    ) -> CacheResult<JoinHandle<()>> {
        let budget = validate_budget(max_bytes)?;
        if interval.is_zero() {
            return Err(CacheError::InvalidInterval);
        }

        let store = self.clone();
        Ok(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(
                "Background sweeper started for {} every {:?}",
                dir.display(),
                interval
            );

            loop {
                ticker.tick().await;
                match store.sweep(&dir, budget).await {
                    SweepOutcome::Completed(report) if report.failed_removals > 0 => {
                        warn!(
                            "Background sweep of {} could not remove {} entries",
                            dir.display(),
                            report.failed_removals
                        );
                    }
                    SweepOutcome::Completed(report) => {
                        debug!(
                            "Background sweep of {}: {} entries, {} bytes",
                            dir.display(),
                            report.entries_scanned - report.removed_count(),
                            report.bytes_after
                        );
                    }
                    SweepOutcome::Skipped { .. } => {
                        debug!(
                            "Background sweep of {} skipped, sweep in progress",
                            dir.display()
                        );
                    }
                }
            }
        }))
    }

    fn resolve_extension<'a>(&'a self, ext: Option<&'a str>) -> &'a str {
        ext.unwrap_or(self.default_extension.as_str())
    }
}

/// Check that a caller-supplied budget is a positive byte count
pub fn validate_budget(max_bytes: i64) -> CacheResult<u64> {
    if max_bytes <= 0 {
        return Err(CacheError::InvalidBudget { max_bytes });
    }
    Ok(max_bytes as u64)
}

fn clean_temp_files_blocking(dir: &Path, max_age: Duration) -> usize {
    let now = SystemTime::now();
    DirectoryScanner::scan_reserved_blocking(dir)
        .into_iter()
        .filter(|(path, _)| {
            path.file_name()
                .map(|n| n.to_string_lossy().starts_with(files::TEMP_FILE_PREFIX))
                .unwrap_or(false)
        })
        .filter(|(_, modified)| {
            modified
                .and_then(|m| now.duration_since(m).ok())
                .map(|age| age > max_age)
                .unwrap_or(false)
        })
        .filter(|(path, _)| match std::fs::remove_file(path) {
            Ok(()) => {
                debug!("Removed abandoned temp file {}", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to remove temp file {}: {}", path.display(), e);
                false
            }
        })
        .count()
}
