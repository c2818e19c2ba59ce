//! ==============================================================================
//! config.rs - Runtime Configuration Loader
//! ==============================================================================
//!
//! purpose:
//!     defines the schema for `aqms.toml`.
//!     loads configuration from file or falls back to defaults.
//!
//! structure:
//!     - ApiConfig: where the AQMS backend lives and how long to wait for it.
//!     - PollingConfig: how often the dashboard refreshes the current reading.
//!     - CacheConfig: where the settings cache is kept.
//!     - LoggingConfig: log level and whether each poll is printed.
//!
//! ==============================================================================

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::api::DEFAULT_BASE_URL;
use crate::settings::FileStorage;

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PollingConfig {
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CacheConfig {
    /// directory holding `aqms-settings.json`; platform config dir when unset
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// keep settings in memory only
    #[serde(default)]
    pub disabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_true")]
    pub show_sensor_data: bool,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    30
}

// the current reading is refreshed every two minutes
fn default_interval() -> u64 {
    120
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

/// Outcome of `DashboardConfig::load_or_default`.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadNote {
    Loaded(PathBuf),
    Failed(PathBuf, String),
    NotFound,
}

impl LoadNote {
    pub fn log(&self) {
        match self {
            LoadNote::Loaded(path) => tracing::info!("config loaded from {}", path.display()),
            LoadNote::Failed(path, e) => {
                tracing::warn!("failed to load {}: {} - using defaults", path.display(), e)
            }
            LoadNote::NotFound => tracing::warn!("no config file found - using defaults"),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { base_url: default_base_url(), timeout_seconds: default_timeout() }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self { interval_seconds: default_interval() }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level(), show_sensor_data: true }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(1))
    }
}

impl CacheConfig {
    /// Resolved cache directory, `None` when caching is off or no config dir exists.
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        if self.disabled {
            return None;
        }
        self.dir.clone().or_else(FileStorage::default_dir)
    }
}

impl DashboardConfig {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| anyhow::anyhow!("Failed to read config file: {}", e))?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse config: {}", e))
    }

    /// First existing `config/aqms.toml`, looking in `.` then `..`.
    pub fn locate() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("config").join("aqms.toml"),
            PathBuf::from("..").join("config").join("aqms.toml"),
        ];
        paths.into_iter().find(|path| path.exists())
    }

    /// Load with default fallback.
    ///
    /// Returns the config plus a note for the caller to log once logging is up.
    pub fn load_or_default(explicit: Option<&Path>) -> (Self, LoadNote) {
        let path = match explicit.map(Path::to_path_buf).or_else(Self::locate) {
            Some(path) => path,
            None => return (Self::default(), LoadNote::NotFound),
        };

        match Self::load(&path) {
            Ok(config) => (config, LoadNote::Loaded(path)),
            Err(e) => (Self::default(), LoadNote::Failed(path, format!("{:#}", e))),
        }
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        let cache = self
            .cache
            .resolved_dir()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "memory".to_string());

        println!("┌─────────────────────────────────────────┐");
        println!("│          DASHBOARD CONFIGURATION        │");
        println!("├─────────────────────────────────────────┤");
        println!("│ API: {}", self.api.base_url);
        println!("│ Timeout: {}s", self.api.timeout_seconds);
        println!("│ Poll Interval: {}s", self.polling.interval_seconds);
        println!("│ Settings Cache: {}", cache);
        println!("│ Log Level: {}", self.logging.level);
        println!("└─────────────────────────────────────────┘");
    }
}
