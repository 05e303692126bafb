//! Capacity enforcement
//!
//! A sweep lists the cache directory, sums the sizes of all entries, and when
//! the total exceeds the budget deletes entries oldest-first by modification
//! time until the running total is back under budget. Names starting with the
//! reserved marker are neither counted nor deleted. Entries that vanish or
//! refuse to be deleted mid-sweep are skipped: sweeps are best-effort.
//!
//! The directory scan uses blocking `std::fs` calls inside
//! `spawn_blocking` so large listings never stall the async runtime.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::lock::EvictionGuard;
use crate::constants::files;

/// A cache entry considered by a sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Full path of the entry
    pub path: PathBuf,
    /// File name, used as the tie-break for equal modification times
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified: SystemTime,
}

impl Candidate {
    /// Oldest first, then by file name for equal timestamps
    fn eviction_order(&self, other: &Self) -> Ordering {
        self.modified
            .cmp(&other.modified)
            .then_with(|| self.file_name.cmp(&other.file_name))
    }
}

/// Summary of a completed sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Entries found in the directory
    pub entries_scanned: usize,
    /// Total entry bytes before the sweep
    pub bytes_before: u64,
    /// Total entry bytes after the sweep
    pub bytes_after: u64,
    /// Entries deleted, oldest first
    pub removed: Vec<PathBuf>,
    /// Entries that could not be deleted
    pub failed_removals: usize,
    /// Wall time spent scanning and deleting
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
}

impl SweepReport {
    /// Bytes released by the sweep
    pub fn bytes_freed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }

    /// Number of entries deleted
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }
}

/// Directory scanner shared by sweeps and statistics
pub struct DirectoryScanner;

impl DirectoryScanner {
    /// Check if a file name is reserved and therefore not a cache entry
    pub fn is_reserved(file_name: &str) -> bool {
        file_name.starts_with(files::RESERVED_MARKER)
    }

    /// List entries and reserved files of `dir` in a single pass (blocking)
    ///
    /// A missing directory is an empty cache. Non-regular files and entries
    /// that fail to stat are left out of both lists.
    pub fn scan_blocking(dir: &Path) -> DirectoryListing {
        let mut listing = DirectoryListing::default();
        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Failed to read cache directory {}: {}", dir.display(), e);
                }
                return listing;
            }
        };

        for entry in entries.flatten() {
            let file_name = entry.file_name().to_string_lossy().into_owned();
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }

            if Self::is_reserved(&file_name) {
                listing
                    .reserved
                    .push((entry.path(), metadata.modified().ok()));
                continue;
            }

            if let Ok(modified) = metadata.modified() {
                listing.entries.push(Candidate {
                    path: entry.path(),
                    file_name,
                    size: metadata.len(),
                    modified,
                });
            }
        }
        listing
    }

    /// List all cache entries in `dir` (blocking)
    ///
    /// Reserved names, non-regular files, and entries that fail to stat are
    /// left out.
    pub fn scan_entries_blocking(dir: &Path) -> Vec<Candidate> {
        Self::scan_blocking(dir).entries
    }

    /// List all cache entries in `dir` without blocking the runtime
    pub async fn scan_entries(dir: &Path) -> Vec<Candidate> {
        let dir = dir.to_path_buf();
        tokio::task::spawn_blocking(move || Self::scan_entries_blocking(&dir))
            .await
            .unwrap_or_else(|e| {
                warn!("Failed to scan cache directory: {}", e);
                Vec::new()
            })
    }

    /// List reserved-marker files in `dir` (blocking)
    pub fn scan_reserved_blocking(dir: &Path) -> Vec<(PathBuf, Option<SystemTime>)> {
        Self::scan_blocking(dir).reserved
    }
}

/// One listing of a cache directory, split by name class
#[derive(Debug, Clone, Default)]
pub struct DirectoryListing {
    /// Regular files that count toward the budget
    pub entries: Vec<Candidate>,
    /// Reserved-marker files with their modification times
    pub reserved: Vec<(PathBuf, Option<SystemTime>)>,
}

/// Oldest-first capacity enforcement
pub struct CapacityEnforcer;

impl CapacityEnforcer {
    /// Sweep `dir` down to at most `max_bytes` of entries
    ///
    /// The guard moves into the blocking task, so the directory stays locked
    /// until the scan and deletes finish even if this future is dropped.
    pub async fn enforce(guard: EvictionGuard, dir: &Path, max_bytes: u64) -> SweepReport {
        let dir = dir.to_path_buf();
        let sweep_dir = dir.clone();

        let report = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            Self::enforce_blocking(&sweep_dir, max_bytes)
        })
        .await
        .unwrap_or_else(|e| {
            warn!("Capacity sweep of {} aborted: {}", dir.display(), e);
            SweepReport::default()
        });

        if report.removed_count() > 0 {
            info!(
                dir = %dir.display(),
                removed = report.removed_count(),
                freed = report.bytes_freed(),
                "Capacity sweep evicted {} entries ({} -> {} bytes, budget {})",
                report.removed_count(),
                report.bytes_before,
                report.bytes_after,
                max_bytes
            );
        }
        report
    }

    /// Blocking sweep implementation
    pub fn enforce_blocking(dir: &Path, max_bytes: u64) -> SweepReport {
        let start_time = Instant::now();
        let candidates = DirectoryScanner::scan_entries_blocking(dir);
        let total: u64 = candidates.iter().map(|c| c.size).sum();

        let mut report = SweepReport {
            entries_scanned: candidates.len(),
            bytes_before: total,
            bytes_after: total,
            ..Default::default()
        };

        if total <= max_bytes {
            debug!(
                "Cache {} within budget: {} of {} bytes",
                dir.display(),
                total,
                max_bytes
            );
            report.duration = start_time.elapsed();
            return report;
        }

        let (removed, failed, remaining) = Self::evict_oldest(candidates, total, max_bytes);
        report.removed = removed;
        report.failed_removals = failed;
        report.bytes_after = remaining;
        report.duration = start_time.elapsed();
        report
    }

    /// Delete candidates oldest-first until `total` fits in `max_bytes`
    ///
    /// Returns the removed paths, the number of failed deletions, and the
    /// remaining total.
    fn evict_oldest(
        mut candidates: Vec<Candidate>,
        mut total: u64,
        max_bytes: u64,
    ) -> (Vec<PathBuf>, usize, u64) {
        candidates.sort_by(Candidate::eviction_order);

        let mut removed = Vec::new();
        let mut failed = 0;

        for candidate in candidates {
            if total <= max_bytes {
                break;
            }
            match std::fs::remove_file(&candidate.path) {
                Ok(()) => {
                    debug!(
                        "Evicted {} ({} bytes)",
                        candidate.path.display(),
                        candidate.size
                    );
                    total = total.saturating_sub(candidate.size);
                    removed.push(candidate.path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    // Removed by someone else: its bytes are gone either way
                    total = total.saturating_sub(candidate.size);
                }
                Err(e) => {
                    warn!("Failed to evict {}: {}", candidate.path.display(), e);
                    failed += 1;
                }
            }
        }

        (removed, failed, total)
    }
}
