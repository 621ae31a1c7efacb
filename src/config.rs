use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Data source configuration
    pub source: SourceConfig,

    /// Derivation engine configuration
    #[validate(nested)]
    pub engine: EngineConfig,

    /// Derivation cache configuration
    #[validate(nested)]
    pub cache: CacheConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default file, an optional override and environment
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let config_path = override_path
            .map(|p| p.to_string_lossy().into_owned())
            .or_else(|| std::env::var("COVID_SERIES_CONFIG").ok())
            .unwrap_or_else(|| "config/local.toml".to_string());

        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: COVID_SERIES_)
            .add_source(
                config::Environment::with_prefix("COVID_SERIES")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: SourceConfig::default(),
            engine: EngineConfig::default(),
            cache: CacheConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataSourceKind {
    #[default]
    Who,
    Ecdc,
    Owid,
    Rki,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Publisher of the snapshot
    #[serde(default)]
    pub kind: DataSourceKind,

    /// Normalized snapshot table
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: DataSourceKind::default(),
            data_file: default_data_file(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EngineConfig {
    /// Width of the rolling average window (days)
    #[serde(default = "default_window")]
    #[validate(range(min = 1, max = 366))]
    pub rolling_window: usize,

    /// Size of each block of the reproduction estimate (days)
    #[serde(default = "default_block_size")]
    #[validate(range(min = 1, max = 60))]
    pub reproduction_block_size: usize,

    /// Minimum number of regions in one call before derivation fans out
    #[serde(default = "default_parallel_min_regions")]
    #[validate(range(min = 1))]
    pub parallel_min_regions: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rolling_window: default_window(),
            reproduction_block_size: default_block_size(),
            parallel_min_regions: default_parallel_min_regions(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CacheConfig {
    /// Enable the derivation cache
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory holding cache entries
    #[serde(default = "default_cache_dir")]
    pub directory: PathBuf,

    /// Enrichment level of built entries (0 disables the cache)
    #[serde(default = "default_cache_level")]
    #[validate(range(max = 4))]
    pub level: u8,

    /// Age in days after which an entry is stale
    #[serde(default = "default_max_age_days")]
    #[validate(range(min = 1))]
    pub max_age_days: i64,

    /// Entries kept in process after loading
    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            directory: default_cache_dir(),
            level: default_cache_level(),
            max_age_days: default_max_age_days(),
            memo_capacity: default_memo_capacity(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

// Default value functions
fn default_data_file() -> PathBuf {
    PathBuf::from("data/who-db.csv")
}

fn default_window() -> usize {
    7
}

fn default_block_size() -> usize {
    4
}

fn default_parallel_min_regions() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("cache")
}

fn default_cache_level() -> u8 {
    2
}

fn default_max_age_days() -> i64 {
    1
}

fn default_memo_capacity() -> u64 {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}
