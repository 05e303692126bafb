//! Atomic entry writes
//!
//! Payloads are written to a uniquely named temporary file in the cache
//! directory itself and then renamed onto the final name. Rename within one
//! directory is atomic, so readers see either the previous complete entry or
//! the new one. Temporary names start with the reserved marker and are
//! therefore invisible to size accounting and eviction while in flight.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, warn};

use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

use super::key::KeyMapper;

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Temp-file + rename writer
pub struct AtomicWriter;

impl AtomicWriter {
    /// Store `data` under the mapped name for `key` in `dir`
    ///
    /// # Errors
    ///
    /// Returns `CacheError` if the directory cannot be created, the temporary
    /// file cannot be written, or the final rename fails. In every error case
    /// the final name is left untouched.
    pub async fn write(dir: &Path, key: &str, data: &[u8], ext: &str) -> CacheResult<PathBuf> {
        ensure_directory_exists(dir).await?;

        let file_name = KeyMapper::file_name(key, ext);
        let final_path = dir.join(&file_name);
        let temp_path = dir.join(temp_file_name(&file_name));

        if let Err(source) = write_temp_file(&temp_path, data).await {
            error!("Failed to write temporary file {}: {}", temp_path.display(), source);
            remove_temp_file(&temp_path).await;
            return Err(CacheError::TempFileError {
                path: temp_path,
                source,
            });
        }

        if let Err(source) = fs::rename(&temp_path, &final_path).await {
            error!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                final_path.display(),
                source
            );
            remove_temp_file(&temp_path).await;
            return Err(CacheError::AtomicOperationFailed {
                temp_path,
                final_path,
                source,
            });
        }

        debug!(
            bytes = data.len(),
            path = %final_path.display(),
            "Stored cache entry"
        );
        Ok(final_path)
    }
}

/// Ensure a directory exists, creating it and its parents if necessary
pub(crate) async fn ensure_directory_exists(path: &Path) -> CacheResult<()> {
    match fs::metadata(path).await {
        Ok(metadata) if metadata.is_dir() => Ok(()),
        _ => {
            fs::create_dir_all(path).await.map_err(|source| {
                error!("Failed to create cache directory {}: {}", path.display(), source);
                CacheError::DirectoryNotAccessible {
                    path: path.to_path_buf(),
                    source,
                }
            })?;
            debug!("Created cache directory: {}", path.display());
            Ok(())
        }
    }
}

/// Temp name unique across processes (pid) and calls (counter plus random suffix)
fn temp_file_name(file_name: &str) -> String {
    format!(
        "{}{}.{}.{}.{:016x}",
        files::TEMP_FILE_PREFIX,
        file_name,
        std::process::id(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed),
        fastrand::u64(..)
    )
}

async fn write_temp_file(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;
    file.write_all(data).await?;
    file.flush().await?;
    file.sync_data().await?;
    Ok(())
}

async fn remove_temp_file(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove temporary file {}: {}", path.display(), e);
        }
    }
}
