//! Core application logic for the FIFO cache
//!
//! This module contains the cache itself: key mapping, atomic writes,
//! lookups, the per-directory eviction lock, and capacity enforcement.
//!
//! # Examples
//!
//! ```rust,no_run
//! use fifo_cache::app::CacheStore;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CacheStore::new();
//! let dir = Path::new("/tmp/fifo-cache");
//!
//! store.put(dir, "report-2024", b"payload", 10 * 1024 * 1024, None).await?;
//! if let Some(bytes) = store.read(dir, "report-2024", None).await? {
//!     println!("Read {} bytes", bytes.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;

// Re-export main public API
pub use cache::{
    format_bytes, validate_budget, validate_extension, CacheConfig, CacheStats, CacheStore,
    CapacityEnforcer, EvictionLock, KeyMapper, Lookup, SweepOutcome, SweepReport,
};
