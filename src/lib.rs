//! FIFO Cache Library
//!
//! A bounded, directory-backed cache for binary payloads. Entries are written
//! atomically and the oldest are evicted first once a directory exceeds its
//! byte budget.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};
