//! Cache configuration types and defaults
//!
//! This module contains the runtime configuration for a cache directory,
//! including default values and validation logic.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{cache, files};
use crate::errors::{CacheError, CacheResult};

use super::key::validate_extension;

/// Configuration for one cache directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory for cache storage
    pub cache_root: PathBuf,
    /// Byte budget for all entries in the directory
    pub max_bytes: u64,
    /// Extension used when callers do not supply one
    pub default_extension: String,
    /// Interval between background sweeps
    pub sweep_interval: Duration,
    /// Age after which leftover temp files are considered abandoned
    pub temp_max_age: Duration,
}

impl CacheConfig {
    /// Create a configuration for `cache_root` with default settings
    pub fn with_cache_root(cache_root: PathBuf) -> Self {
        Self {
            cache_root,
            max_bytes: cache::DEFAULT_MAX_BYTES,
            default_extension: files::DEFAULT_EXTENSION.to_string(),
            sweep_interval: cache::DEFAULT_SWEEP_INTERVAL,
            temp_max_age: cache::DEFAULT_TEMP_MAX_AGE,
        }
    }

    /// Set the byte budget
    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    /// Set the default extension
    pub fn with_default_extension(mut self, ext: impl Into<String>) -> Self {
        self.default_extension = ext.into();
        self
    }

    /// Set the background sweep interval
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Set the abandoned temp file age
    pub fn with_temp_max_age(mut self, age: Duration) -> Self {
        self.temp_max_age = age;
        self
    }

    /// Budget as the signed type accepted by the cache operations
    pub fn budget(&self) -> i64 {
        i64::try_from(self.max_bytes).unwrap_or(i64::MAX)
    }

    /// Check the settings a cache store relies on
    pub fn validate(&self) -> CacheResult<()> {
        if self.max_bytes == 0 {
            return Err(CacheError::InvalidBudget { max_bytes: 0 });
        }
        validate_extension(&self.default_extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::with_cache_root(PathBuf::from("/tmp/cache"));
        assert_eq!(config.cache_root, PathBuf::from("/tmp/cache"));
        assert_eq!(config.max_bytes, cache::DEFAULT_MAX_BYTES);
        assert_eq!(config.default_extension, files::DEFAULT_EXTENSION);
        assert_eq!(config.sweep_interval, cache::DEFAULT_SWEEP_INTERVAL);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = CacheConfig::with_cache_root(PathBuf::from("/tmp/cache"))
            .with_max_bytes(1024)
            .with_default_extension("png")
            .with_sweep_interval(Duration::from_secs(10))
            .with_temp_max_age(Duration::from_secs(60));

        assert_eq!(config.max_bytes, 1024);
        assert_eq!(config.default_extension, "png");
        assert_eq!(config.sweep_interval, Duration::from_secs(10));
        assert_eq!(config.temp_max_age, Duration::from_secs(60));
        assert_eq!(config.budget(), 1024);
    }

    #[test]
    fn test_validation() {
        let zero = CacheConfig::with_cache_root(PathBuf::from("/c")).with_max_bytes(0);
        assert!(matches!(
            zero.validate(),
            Err(CacheError::InvalidBudget { max_bytes: 0 })
        ));

        let bad_ext =
            CacheConfig::with_cache_root(PathBuf::from("/c")).with_default_extension("../x");
        assert!(matches!(
            bad_ext.validate(),
            Err(CacheError::InvalidExtension { .. })
        ));
    }

    #[test]
    fn test_budget_saturates() {
        let config = CacheConfig::with_cache_root(PathBuf::from("/c")).with_max_bytes(u64::MAX);
        assert_eq!(config.budget(), i64::MAX);
    }
}
