//! Configuration management for fgakit.
//!
//! This module provides configuration loading with multiple sources:
//! 1. Default values (hardcoded)
//! 2. Configuration file (YAML)
//! 3. Environment variables (override)
//!
//! # Configuration Hierarchy
//!
//! Environment variables take precedence over config file values,
//! which take precedence over defaults.
//!
//! # Example
//!
//! ```ignore
//! use fgakit::config::FgaKitConfig;
//!
//! // Load from file with env overrides
//! let config = FgaKitConfig::load("fgakit.yaml")?;
//!
//! // Or load from environment only
//! let config = FgaKitConfig::from_env()?;
//! ```

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use fgakit_domain::PermissionCacheConfig;
use serde::{Deserialize, Serialize};

/// Environment variable prefix.
const ENV_PREFIX: &str = "FGAKIT";

/// Toolkit configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct FgaKitConfig {
    /// Permission cache settings
    #[serde(default)]
    pub cache: CacheSettings,

    /// Snapshot storage settings
    #[serde(default)]
    pub snapshot: SnapshotSettings,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Permission cache settings.
///
/// These settings can be overridden via environment variables with the `FGAKIT_` prefix
/// and `__` as the nested key separator:
///
/// - `FGAKIT_CACHE__ENABLED=true` - Turn caching on
/// - `FGAKIT_CACHE__TTL_SECS=60` - Shorten entry lifetime
///
/// # Example YAML Configuration
///
/// ```yaml
/// cache:
///   enabled: true
///   prefix: openfga
///   max_capacity: 10000
///   ttl_secs: 300
/// ```
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct CacheSettings {
    /// Enable the permission cache.
    ///
    /// When disabled every cache operation is a no-op.
    #[serde(default)]
    pub enabled: bool,

    /// Prefix for every cache key
    #[serde(default = "default_cache_prefix")]
    pub prefix: String,

    /// Maximum number of cached entries
    #[serde(default = "default_max_capacity")]
    pub max_capacity: u64,

    /// Entry time-to-live in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            prefix: default_cache_prefix(),
            max_capacity: default_max_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl CacheSettings {
    /// Converts these settings into a [`PermissionCacheConfig`].
    pub fn to_cache_config(&self) -> PermissionCacheConfig {
        PermissionCacheConfig::default()
            .with_enabled(self.enabled)
            .with_prefix(self.prefix.clone())
            .with_max_capacity(self.max_capacity)
            .with_ttl(Duration::from_secs(self.ttl_secs))
    }
}

fn default_cache_prefix() -> String {
    "openfga".to_string()
}

fn default_max_capacity() -> u64 {
    10_000
}

fn default_ttl_secs() -> u64 {
    300
}

/// Snapshot storage settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SnapshotSettings {
    /// Directory snapshot files are written to
    #[serde(default = "default_snapshot_directory")]
    pub directory: String,
}

impl Default for SnapshotSettings {
    fn default() -> Self {
        Self {
            directory: default_snapshot_directory(),
        }
    }
}

fn default_snapshot_directory() -> String {
    "tests/snapshots".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct LoggingSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Use JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ConfigError),

    #[error("configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("invalid configuration: {message}")]
    Invalid { message: String },
}

fn environment() -> Environment {
    // FGAKIT_CACHE__TTL_SECS -> cache.ttl_secs
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}

impl FgaKitConfig {
    /// Load configuration from a YAML file with environment variable overrides.
    ///
    /// Environment variables are prefixed with `FGAKIT_` and use `__` as separator.
    /// For example:
    /// - `FGAKIT_CACHE__ENABLED=true` overrides `cache.enabled`
    /// - `FGAKIT_SNAPSHOT__DIRECTORY=...` overrides `snapshot.directory`
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigLoadError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let config = Config::builder()
            .add_source(Config::try_from(&FgaKitConfig::default())?)
            .add_source(File::from(path).format(FileFormat::Yaml))
            .add_source(environment())
            .build()?;

        let fgakit_config: FgaKitConfig = config.try_deserialize()?;
        fgakit_config.validate()?;

        Ok(fgakit_config)
    }

    /// Load configuration from environment variables only.
    ///
    /// Uses default values and allows overrides via `FGAKIT_` prefixed env vars.
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        let config = Config::builder()
            .add_source(Config::try_from(&FgaKitConfig::default())?)
            .add_source(environment())
            .build()?;

        let fgakit_config: FgaKitConfig = config.try_deserialize()?;
        fgakit_config.validate()?;

        Ok(fgakit_config)
    }

    /// Validate the configuration.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.cache.prefix.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                message: "cache.prefix must not be empty".to_string(),
            });
        }

        // A disabled cache never reads these
        if self.cache.enabled {
            if self.cache.ttl_secs == 0 {
                return Err(ConfigLoadError::Invalid {
                    message: "cache.ttl_secs must be greater than 0 when the cache is enabled"
                        .to_string(),
                });
            }
            if self.cache.max_capacity == 0 {
                return Err(ConfigLoadError::Invalid {
                    message: "cache.max_capacity must be greater than 0 when the cache is enabled"
                        .to_string(),
                });
            }
        }

        if self.snapshot.directory.trim().is_empty() {
            return Err(ConfigLoadError::Invalid {
                message: "snapshot.directory must not be empty".to_string(),
            });
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigLoadError::Invalid {
                message: format!(
                    "logging.level must be one of: {:?}, got: {}",
                    valid_levels, self.logging.level
                ),
            });
        }

        Ok(())
    }
}
