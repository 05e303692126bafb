//! Configuration management for the FIFO cache
//!
//! This module provides configuration loading with multi-source precedence
//! and zero-config defaults. Values are layered as defaults, then a TOML
//! config file, then environment variables; CLI flags are applied last by the
//! command handlers.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::app::cache::{validate_extension, CacheConfig};
use crate::constants::{cache, env, files};
use crate::errors::{ConfigError, ConfigResult};

/// Application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Cache settings
    pub cache: CacheConfigToml,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly cache configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfigToml {
    /// Cache directory path (None = OS cache directory)
    pub cache_dir: Option<PathBuf>,
    /// Byte budget for cache entries
    pub max_bytes: u64,
    /// Extension used when none is given
    pub default_extension: String,
    /// Interval between background sweeps, e.g. "5m"
    #[serde(with = "humantime_serde")]
    pub sweep_interval: Duration,
    /// Age after which temp files count as abandoned, e.g. "1h"
    #[serde(with = "humantime_serde")]
    pub temp_max_age: Duration,
}

impl Default for CacheConfigToml {
    fn default() -> Self {
        Self {
            cache_dir: None,
            max_bytes: cache::DEFAULT_MAX_BYTES,
            default_extension: files::DEFAULT_EXTENSION.to_string(),
            sweep_interval: cache::DEFAULT_SWEEP_INTERVAL,
            temp_max_age: cache::DEFAULT_TEMP_MAX_AGE,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level for the application
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    pub async fn load(config_file_override: Option<PathBuf>) -> ConfigResult<Self> {
        let mut config = Self::default();

        let config_path = match config_file_override {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound { path });
                }
                Some(path)
            }
            None => Self::find_config_file(),
        };

        if let Some(path) = config_path {
            debug!("Loading config from: {}", path.display());
            config = Self::load_from_file(&path).await?;
        }

        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from(".").join(files::LOCAL_CONFIG_FILE)];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Get the default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::APP_DIR_NAME).join("config.toml"))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }

    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) -> ConfigResult<()> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from a variable source
    ///
    /// Empty values are ignored so an exported-but-blank variable does not
    /// clobber the file configuration.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(dir) = get(env::CACHE_DIR) {
            debug!("Cache directory overridden by {}", env::CACHE_DIR);
            self.cache.cache_dir = Some(PathBuf::from(dir));
        }

        if let Some(value) = get(env::MAX_BYTES) {
            self.cache.max_bytes = value.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidValue {
                    field: env::MAX_BYTES.to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        if let Some(ext) = get(env::EXTENSION) {
            self.cache.default_extension = ext;
        }

        Ok(())
    }

    /// Validate the loaded configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();

        if self.cache.max_bytes == 0 {
            errors.push("cache.max_bytes must be greater than 0".to_string());
        }
        if let Err(e) = validate_extension(&self.cache.default_extension) {
            errors.push(format!("cache.default_extension: {}", e));
        }
        if self.cache.sweep_interval.is_zero() {
            errors.push("cache.sweep_interval must be greater than 0".to_string());
        }
        if self.logging.level.parse::<tracing::Level>().is_err() {
            errors.push(format!("logging.level: unknown level {:?}", self.logging.level));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::ValidationFailed { errors })
        }
    }

    /// Convert to the runtime cache configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoCacheDirectory` when no directory is configured
    /// and the OS cache directory cannot be determined.
    pub fn to_runtime_config(&self) -> ConfigResult<CacheConfig> {
        let cache_root = match &self.cache.cache_dir {
            Some(dir) => dir.clone(),
            None => default_cache_dir().ok_or(ConfigError::NoCacheDirectory)?,
        };

        Ok(CacheConfig::with_cache_root(cache_root)
            .with_max_bytes(self.cache.max_bytes)
            .with_default_extension(self.cache.default_extension.clone())
            .with_sweep_interval(self.cache.sweep_interval)
            .with_temp_max_age(self.cache.temp_max_age))
    }
}

/// OS-specific default cache directory
pub fn default_cache_dir() -> Option<PathBuf> {
    dirs::cache_dir().map(|dir| dir.join(files::APP_DIR_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config_creation() {
        let config = AppConfig::default();

        assert_eq!(config.cache.max_bytes, cache::DEFAULT_MAX_BYTES);
        assert_eq!(config.cache.default_extension, "bin");
        assert_eq!(config.cache.sweep_interval, Duration::from_secs(300));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[tokio::test]
    async fn test_config_loading_nonexistent_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        // Should fail when explicitly specified
        let result = AppConfig::load(Some(config_path)).await;
        assert!(matches!(result, Err(ConfigError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_config_loading_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("fifo-cache.toml");

        let test_config = r#"
[cache]
cache_dir = "/srv/cache/thumbs"
max_bytes = 5242880
default_extension = "png"
sweep_interval = "30s"
temp_max_age = "2h"

[logging]
level = "debug"
"#;
        tokio::fs::write(&config_path, test_config).await.unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();
        assert_eq!(
            config.cache.cache_dir,
            Some(PathBuf::from("/srv/cache/thumbs"))
        );
        assert_eq!(config.cache.max_bytes, 5_242_880);
        assert_eq!(config.cache.default_extension, "png");
        assert_eq!(config.cache.sweep_interval, Duration::from_secs(30));
        assert_eq!(config.cache.temp_max_age, Duration::from_secs(7_200));
        assert_eq!(config.logging.level, "debug");
    }

    #[tokio::test]
    async fn test_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        tokio::fs::write(&config_path, "[cache]\nmax_bytes = 100\n")
            .await
            .unwrap();

        let config = AppConfig::load_from_file(&config_path).await.unwrap();
        assert_eq!(config.cache.max_bytes, 100);
        assert_eq!(config.cache.default_extension, files::DEFAULT_EXTENSION);
        assert_eq!(config.cache.temp_max_age, cache::DEFAULT_TEMP_MAX_AGE);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[tokio::test]
    async fn test_invalid_toml_is_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        tokio::fs::write(&config_path, "[cache\nmax_bytes = ")
            .await
            .unwrap();

        let result = AppConfig::load_from_file(&config_path).await;
        assert!(matches!(result, Err(ConfigError::InvalidFormat(_))));
    }

    #[test]
    fn test_overrides_take_precedence() {
        let mut config = AppConfig::default();
        let env_vars = vars(&[
            (env::CACHE_DIR, "/var/cache/override"),
            (env::MAX_BYTES, " 2048 "),
            (env::EXTENSION, "webp"),
        ]);

        config
            .apply_overrides_from(|name| env_vars.get(name).cloned())
            .unwrap();

        assert_eq!(
            config.cache.cache_dir,
            Some(PathBuf::from("/var/cache/override"))
        );
        assert_eq!(config.cache.max_bytes, 2048);
        assert_eq!(config.cache.default_extension, "webp");
    }

    #[test]
    fn test_blank_overrides_are_ignored() {
        let mut config = AppConfig::default();
        let env_vars = vars(&[(env::CACHE_DIR, ""), (env::EXTENSION, "  ")]);

        config
            .apply_overrides_from(|name| env_vars.get(name).cloned())
            .unwrap();

        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_budget_override() {
        let mut config = AppConfig::default();
        let env_vars = vars(&[(env::MAX_BYTES, "lots")]);

        let result = config.apply_overrides_from(|name| env_vars.get(name).cloned());
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { ref field, .. }) if field == env::MAX_BYTES
        ));
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let mut config = AppConfig::default();
        config.cache.max_bytes = 0;
        config.cache.default_extension = "../escape".to_string();
        config.cache.sweep_interval = Duration::ZERO;
        config.logging.level = "loud".to_string();

        match config.validate() {
            Err(ConfigError::ValidationFailed { errors }) => assert_eq!(errors.len(), 4),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_to_runtime_config() {
        let mut config = AppConfig::default();
        config.cache.cache_dir = Some(PathBuf::from("/tmp/fifo"));
        config.cache.max_bytes = 4096;

        let runtime = config.to_runtime_config().unwrap();
        assert_eq!(runtime.cache_root, PathBuf::from("/tmp/fifo"));
        assert_eq!(runtime.max_bytes, 4096);
        assert_eq!(runtime.default_extension, "bin");
        assert_eq!(runtime.sweep_interval, cache::DEFAULT_SWEEP_INTERVAL);
    }
}
