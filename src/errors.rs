//! Error types for the FIFO cache
//!
//! Errors are split by concern: cache operations, configuration, and a
//! top-level application error used by the CLI. Precondition violations are
//! kept distinct from I/O failures so callers can tell a bad argument from a
//! failing disk.

use std::path::PathBuf;
use thiserror::Error;

/// Cache operation errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Byte budget was zero or negative
    #[error("Invalid cache budget: {max_bytes} bytes. The budget must be a positive integer")]
    InvalidBudget { max_bytes: i64 },

    /// Extension hint would escape the flat cache namespace
    #[error("Invalid file extension: {ext:?}")]
    InvalidExtension { ext: String },

    /// Background sweep interval was zero
    #[error("Invalid sweep interval: the interval must be greater than zero")]
    InvalidInterval,

    /// Cache directory could not be created or accessed
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temporary file could not be created or written
    #[error("Temporary file operation failed: {path}")]
    TempFileError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rename of the temporary file onto the final name failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A resolved entry could not be read
    #[error("Failed to read cache entry: {path}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Generic I/O error
    #[error("Cache I/O error")]
    Io(#[from] std::io::Error),
}

impl CacheError {
    /// Whether this error is a caller contract violation rather than a runtime failure
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            CacheError::InvalidBudget { .. }
                | CacheError::InvalidExtension { .. }
                | CacheError::InvalidInterval
        )
    }
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file: {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    /// No cache directory could be determined
    #[error("Could not determine a cache directory. Set FIFO_CACHE_DIR or pass --cache-dir")]
    NoCacheDirectory,

    /// Configuration validation failed
    #[error("Configuration validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<String> },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON output error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Cache(CacheError::TempFileError { .. })
            | AppError::Cache(CacheError::AtomicOperationFailed { .. })
            | AppError::Cache(CacheError::ReadFailed { .. })
            | AppError::Cache(CacheError::Io(_))
            | AppError::Io(_) => true,

            AppError::Cache(CacheError::InvalidBudget { .. })
            | AppError::Cache(CacheError::InvalidExtension { .. })
            | AppError::Cache(CacheError::InvalidInterval)
            | AppError::Config(_) => false,

            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Cache(e) if e.is_precondition_violation() => "precondition",
            AppError::Cache(_) => "cache",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Json(_) => "output",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
