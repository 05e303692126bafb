//! Prelude module for the FIFO cache library
//!
//! This module re-exports the most commonly used items from the library,
//! providing a convenient way to import everything needed for typical usage
//! with a single `use fifo_cache::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use fifo_cache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let store = CacheStore::new();
//!     let dir = PathBuf::from("/tmp/fifo-cache");
//!
//!     store.put(&dir, "key", b"value", 1024, Some("txt")).await?;
//!     let outcome = store.enforce_capacity(&dir, 1024).await?;
//!     println!("Sweep ran: {}", outcome.is_completed());
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, CacheError, CacheResult, Result};

// Essential cache components
pub use crate::app::cache::{
    CacheConfig, CacheStats, CacheStore, EvictionLock, KeyMapper, SweepOutcome, SweepReport,
};

// Configuration loading
pub use crate::config::AppConfig;

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

// Common external crate re-exports for convenience
pub use tokio;
