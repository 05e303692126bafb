//! Application constants for the FIFO cache
//!
//! This module centralizes the constants used throughout the crate,
//! organized by functional domain.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Cache directory override
    pub const CACHE_DIR: &str = "FIFO_CACHE_DIR";

    /// Byte budget override
    pub const MAX_BYTES: &str = "FIFO_CACHE_MAX_BYTES";

    /// Default extension override
    pub const EXTENSION: &str = "FIFO_CACHE_EXTENSION";
}

/// On-disk layout constants
pub mod files {
    /// Names starting with this character are never cache entries
    pub const RESERVED_MARKER: char = '.';

    /// Prefix of in-flight temporary files (starts with the reserved marker)
    pub const TEMP_FILE_PREFIX: &str = ".tmp-";

    /// Extension used when the caller does not supply one
    pub const DEFAULT_EXTENSION: &str = "bin";

    /// Longest accepted extension hint, in bytes
    pub const MAX_EXTENSION_LEN: usize = 32;

    /// Application directory name under the OS cache/config directories
    pub const APP_DIR_NAME: &str = "fifo-cache";

    /// Project-local configuration file name
    pub const LOCAL_CONFIG_FILE: &str = "fifo-cache.toml";
}

/// Cache sizing and maintenance defaults
pub mod cache {
    use super::Duration;

    /// Default byte budget (1 GiB)
    pub const DEFAULT_MAX_BYTES: u64 = 1024 * 1024 * 1024;

    /// Default interval between background sweeps
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

    /// Temporary files older than this are considered abandoned
    pub const DEFAULT_TEMP_MAX_AGE: Duration = Duration::from_secs(60 * 60);
}

/// CLI exit codes
pub mod exit {
    /// Command failed
    pub const FAILURE: i32 = 1;

    /// `get` found no entry for the key
    pub const MISS: i32 = 2;
}
