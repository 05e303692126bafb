//! Bounded, directory-backed binary cache with atomic writes and FIFO eviction
//!
//! Entries live flat in a caller-chosen directory under names derived from the
//! SHA-256 of the key. Writes go through a temp file and a rename so readers
//! never see partial content, and a capacity sweep deletes the oldest entries
//! once the directory exceeds its byte budget.
//!
//! # Key Features
//!
//! - **Stable naming**: Key bytes hash to a 43 character URL-safe digest plus extension
//! - **Atomic writes**: Temp file + rename, temp names hidden behind the reserved marker
//! - **FIFO eviction**: Oldest modification time goes first, file name breaks ties
//! - **Single sweeper**: At most one sweep per directory; contending callers skip
//! - **No index**: The directory listing is the only state, so the cache survives restarts
//!
//! # Module Organization
//!
//! - [`key`] - Key to file name mapping and extension validation
//! - [`writer`] - Atomic temp-file + rename writes
//! - [`lookup`] - Existence checks for cache entries
//! - [`lock`] - Process-wide per-directory eviction lock
//! - [`eviction`] - Directory scanning and oldest-first capacity enforcement
//! - [`store`] - `CacheStore` facade combining the above
//! - [`stats`] - Cache statistics and disk usage monitoring
//! - [`config`] - Configuration types and defaults
//!
//! # Examples
//!
//! ```rust,no_run
//! use fifo_cache::app::cache::CacheStore;
//! use std::path::Path;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = CacheStore::new();
//! let dir = Path::new("/var/cache/thumbnails");
//!
//! // Store an entry; the directory is swept down to 1 MiB afterwards
//! let path = store.put(dir, "user:42:avatar", b"...", 1024 * 1024, Some("png")).await?;
//! println!("Stored at {}", path.display());
//!
//! match store.get(dir, "user:42:avatar", Some("png")).await {
//!     Some(path) => println!("Hit: {}", path.display()),
//!     None => println!("Miss"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod eviction;
pub mod key;
pub mod lock;
pub mod lookup;
pub mod stats;
pub mod store;
pub mod writer;

#[cfg(test)]
pub mod tests;

// Re-export main public API
pub use config::CacheConfig;
pub use eviction::{
    Candidate, CapacityEnforcer, DirectoryListing, DirectoryScanner, SweepReport,
};
pub use key::{validate_extension, KeyMapper};
pub use lock::{directory_key, EvictionGuard, EvictionLock, LockStatus, LockToken};
pub use lookup::Lookup;
pub use stats::{format_bytes, CacheStats};
pub use store::{validate_budget, CacheStore, SweepOutcome};
pub use writer::AtomicWriter;
