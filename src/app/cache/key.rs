//! Key to file name mapping
//!
//! Cache keys are arbitrary strings supplied by callers. They are hashed with
//! SHA-256 and encoded with the URL-safe base64 alphabet (no padding), which
//! never produces path separators or a leading reserved marker, so every key
//! lands as a single flat file name inside the cache directory.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

/// Deterministic mapping from `(key, extension)` to a file name
pub struct KeyMapper;

impl KeyMapper {
    /// Map a key and extension hint to the entry's file name
    ///
    /// A leading `.` on the extension is ignored, so `"png"` and `".png"`
    /// produce the same name. An empty extension yields the bare digest.
    pub fn file_name(key: &str, ext: &str) -> String {
        let digest = Self::digest(key);
        let ext = normalize_extension(ext);
        if ext.is_empty() {
            digest
        } else {
            format!("{}.{}", digest, ext)
        }
    }

    /// URL-safe encoding of the key's SHA-256 digest (43 characters)
    pub fn digest(key: &str) -> String {
        let hash = Sha256::digest(key.as_bytes());
        URL_SAFE_NO_PAD.encode(hash)
    }
}

fn normalize_extension(ext: &str) -> &str {
    ext.strip_prefix('.').unwrap_or(ext)
}

/// Reject extension hints that could escape the flat namespace
pub fn validate_extension(ext: &str) -> CacheResult<()> {
    let normalized = normalize_extension(ext);
    let invalid = normalized.len() > files::MAX_EXTENSION_LEN
        || normalized.contains(['/', '\\', '\0'])
        || normalized.contains("..")
        || normalized.starts_with(files::RESERVED_MARKER);

    if invalid {
        return Err(CacheError::InvalidExtension {
            ext: ext.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_mapping_is_stable() {
        let a = KeyMapper::file_name("v1:card:hello", "png");
        let b = KeyMapper::file_name("v1:card:hello", "png");
        assert_eq!(a, b);
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn test_known_digest() {
        // SHA-256("") = e3b0c442...b855
        assert_eq!(
            KeyMapper::digest(""),
            "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU"
        );
    }

    #[test]
    fn test_distinct_keys_distinct_names() {
        let names: HashSet<String> = (0..1000)
            .map(|i| KeyMapper::file_name(&format!("key-{}", i), "bin"))
            .collect();
        assert_eq!(names.len(), 1000);
    }

    #[test]
    fn test_names_are_filesystem_safe() {
        for key in ["", "a/b/c", "../../etc/passwd", "ключ", "with space", "\0"] {
            let name = KeyMapper::file_name(key, "png");
            let (stem, ext) = name.split_once('.').unwrap();
            assert_eq!(stem.len(), 43);
            assert_eq!(ext, "png");
            assert!(stem
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
            assert!(!name.starts_with(files::RESERVED_MARKER));
        }
    }

    #[test]
    fn test_extension_normalization() {
        assert_eq!(
            KeyMapper::file_name("k", ".png"),
            KeyMapper::file_name("k", "png")
        );
        assert_eq!(KeyMapper::file_name("k", ""), KeyMapper::digest("k"));
    }

    #[test]
    fn test_same_key_different_extension() {
        assert_ne!(
            KeyMapper::file_name("k", "png"),
            KeyMapper::file_name("k", "jpg")
        );
    }

    #[test]
    fn test_validate_extension() {
        assert!(validate_extension("png").is_ok());
        assert!(validate_extension(".webp").is_ok());
        assert!(validate_extension("").is_ok());
        assert!(validate_extension("tar.gz").is_ok());

        assert!(validate_extension("../x").is_err());
        assert!(validate_extension("a/b").is_err());
        assert!(validate_extension("a\\b").is_err());
        assert!(validate_extension("..").is_err());
        assert!(validate_extension(&"x".repeat(33)).is_err());
    }
}
