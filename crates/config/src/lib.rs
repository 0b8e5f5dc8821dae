#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for tagsweep
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/tagsweep/config.toml)
//! - Environment variables (`TAGSWEEP_*`)
//! - CLI flags (applied by the app, highest precedence)
//!
//! AWS credentials are deliberately NOT part of this config; they are
//! resolved by the standard SDK credential chain (environment, profiles,
//! instance metadata) when the storage client is built.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tagsweep_errors::{ConfigError, Error};
use tokio::fs;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub sweep: SweepConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

/// General application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    /// Emit machine-readable JSON instead of the table renderer
    #[serde(default)]
    pub json: bool,
    /// Enable debug-level diagnostics
    #[serde(default)]
    pub debug: bool,
}

/// Network retry configuration for the storage transport
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    /// Retry attempts for retriable transport failures
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Initial backoff delay in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

/// Sweep behavior configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Bucket to sweep when none is given on the command line
    #[serde(default)]
    pub bucket: Option<String>,
    /// Restrict the sweep to keys under this prefix
    #[serde(default)]
    pub prefix: Option<String>,
    /// Concurrent object checks; kept small to stay under request-rate limits
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: None,
            concurrency: default_concurrency(),
        }
    }
}

/// Storage endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Endpoint override for non-AWS S3-compatible stores
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Region; falls back to the SDK's own resolution when unset
    #[serde(default)]
    pub region: Option<String>,
    /// Path-style addressing, required by most self-hosted backends
    #[serde(default)]
    pub force_path_style: bool,
}

impl Config {
    /// Default configuration file path (~/.config/tagsweep/config.toml)
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let home = std::env::var("HOME").map_err(|_| ConfigError::ReadFailed {
            path: "~/.config/tagsweep/config.toml".to_string(),
            message: "HOME is not set".to_string(),
        })?;
        Ok(PathBuf::from(home).join(".config/tagsweep/config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| ConfigError::ReadFailed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseFailed {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration from an optional path or fall back to the default
    /// location, using built-in defaults when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read or parsed.
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => {
                let config_path = Self::default_path()?;
                if config_path.exists() {
                    Self::load_from_file(&config_path).await
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain values that cannot
    /// be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(bucket) = std::env::var("TAGSWEEP_BUCKET") {
            self.sweep.bucket = Some(bucket);
        }

        if let Ok(prefix) = std::env::var("TAGSWEEP_PREFIX") {
            self.sweep.prefix = Some(prefix);
        }

        if let Ok(endpoint) = std::env::var("TAGSWEEP_ENDPOINT") {
            self.storage.endpoint = Some(endpoint);
        }

        if let Ok(region) = std::env::var("TAGSWEEP_REGION") {
            self.storage.region = Some(region);
        }

        if let Ok(concurrency) = std::env::var("TAGSWEEP_CONCURRENCY") {
            self.sweep.concurrency =
                concurrency.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "TAGSWEEP_CONCURRENCY".to_string(),
                    reason: format!("not a positive integer: {concurrency}"),
                })?;
        }

        if let Ok(retries) = std::env::var("TAGSWEEP_RETRIES") {
            self.network.retries = retries.parse().map_err(|_| ConfigError::InvalidValue {
                field: "TAGSWEEP_RETRIES".to_string(),
                reason: format!("not an integer: {retries}"),
            })?;
        }

        Ok(())
    }

    /// Validate cross-field constraints after all layers are merged.
    ///
    /// # Errors
    ///
    /// Returns an error if the merged configuration is unusable.
    pub fn validate(&self) -> Result<(), Error> {
        if self.sweep.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "sweep.concurrency".to_string(),
                reason: "must be at least 1".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

// Default value functions for serde
fn default_timeout() -> u64 {
    300 // 5 minutes, large objects stream slowly
}

fn default_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_concurrency() -> usize {
    4
}
