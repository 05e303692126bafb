//! Cache statistics and disk usage monitoring
//!
//! This module summarizes a cache directory: how many entries it holds, how
//! many bytes they use, and the age range of the entries.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::eviction::{Candidate, DirectoryScanner};

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Cache root directory
    pub cache_root: PathBuf,
    /// Number of cache entries on disk
    pub entry_count: usize,
    /// Total size of cache entries in bytes
    pub total_size: u64,
    /// Number of reserved-marker files (temp files and out-of-band data)
    pub reserved_count: usize,
    /// Modification time of the oldest entry
    pub oldest_entry: Option<DateTime<Utc>>,
    /// Modification time of the newest entry
    pub newest_entry: Option<DateTime<Utc>>,
}

impl CacheStats {
    /// Create empty statistics for a directory
    pub fn new(cache_root: PathBuf) -> Self {
        Self {
            cache_root,
            entry_count: 0,
            total_size: 0,
            reserved_count: 0,
            oldest_entry: None,
            newest_entry: None,
        }
    }

    /// Build statistics from scanned entries
    pub fn from_candidates(
        cache_root: PathBuf,
        candidates: &[Candidate],
        reserved_count: usize,
    ) -> Self {
        let mut stats = Self::new(cache_root);
        stats.entry_count = candidates.len();
        stats.total_size = candidates.iter().map(|c| c.size).sum();
        stats.reserved_count = reserved_count;
        stats.oldest_entry = candidates
            .iter()
            .map(|c| c.modified)
            .min()
            .map(DateTime::<Utc>::from);
        stats.newest_entry = candidates
            .iter()
            .map(|c| c.modified)
            .max()
            .map(DateTime::<Utc>::from);
        stats
    }

    /// Collect statistics for `dir` without blocking the runtime
    pub async fn collect(dir: &Path) -> Self {
        let cache_root = dir.to_path_buf();
        let scan_root = cache_root.clone();

        tokio::task::spawn_blocking(move || {
            let listing = DirectoryScanner::scan_blocking(&scan_root);
            Self::from_candidates(scan_root, &listing.entries, listing.reserved.len())
        })
        .await
        .unwrap_or_else(|e| {
            warn!("Failed to scan cache directory: {}", e);
            Self::new(cache_root)
        })
    }

    /// Usage as a percentage of a byte budget
    pub fn usage_percentage(&self, max_bytes: u64) -> f64 {
        if max_bytes == 0 {
            return 0.0;
        }
        (self.total_size as f64 / max_bytes as f64) * 100.0
    }

    /// Check if the cache holds more than its budget
    pub fn is_over_budget(&self, max_bytes: u64) -> bool {
        self.total_size > max_bytes
    }

    /// Format cache size in human-readable format
    pub fn format_cache_size(&self) -> String {
        format_bytes(self.total_size)
    }
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    const THRESHOLD: u64 = 1024;

    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= THRESHOLD as f64 && unit_index < UNITS.len() - 1 {
        size /= THRESHOLD as f64;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.2} {}", size, UNITS[unit_index])
    }
}
