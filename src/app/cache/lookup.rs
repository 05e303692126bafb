//! Key resolution
//!
//! Lookups take no lock. A concurrent sweep may remove an entry between
//! resolution and the caller's read; that race, a missing entry, and a
//! directory squatting on the mapped name all surface as a miss.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use super::key::KeyMapper;

/// Resolves keys to existing entry paths
pub struct Lookup;

impl Lookup {
    /// Return the entry path for `key` if it exists as a regular file
    pub async fn resolve(dir: &Path, key: &str, ext: &str) -> Option<PathBuf> {
        let path = dir.join(KeyMapper::file_name(key, ext));

        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Some(path),
            Ok(_) => {
                debug!("Cache name is not a regular file: {}", path.display());
                None
            }
            Err(e) => {
                debug!("Cache miss for {}: {}", path.display(), e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_resolve_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join(KeyMapper::file_name("k", "png"));
        std::fs::write(&path, b"bytes").unwrap();

        assert_eq!(Lookup::resolve(temp_dir.path(), "k", "png").await, Some(path));
    }

    #[tokio::test]
    async fn test_resolve_missing_key() {
        let temp_dir = TempDir::new().unwrap();
        assert_eq!(Lookup::resolve(temp_dir.path(), "never", "png").await, None);
    }

    #[tokio::test]
    async fn test_resolve_wrong_extension_misses() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(KeyMapper::file_name("k", "png")),
            b"bytes",
        )
        .unwrap();

        assert_eq!(Lookup::resolve(temp_dir.path(), "k", "jpg").await, None);
    }

    #[tokio::test]
    async fn test_resolve_directory_is_miss() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join(KeyMapper::file_name("k", "png"))).unwrap();

        assert_eq!(Lookup::resolve(temp_dir.path(), "k", "png").await, None);
    }

    #[tokio::test]
    async fn test_resolve_missing_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("absent");
        assert_eq!(Lookup::resolve(&dir, "k", "png").await, None);
    }
}
