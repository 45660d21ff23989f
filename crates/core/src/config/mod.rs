//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (SHEETVIEW_*)
//! 2. TOML config file (if SHEETVIEW_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (SHEETVIEW_*)
/// 2. TOML config file (if SHEETVIEW_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Google spreadsheet identifier.
    ///
    /// Set via SHEETVIEW_SPREADSHEET_ID environment variable.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,

    /// Path to the JSON credentials file (`api_key` or `access_token`).
    ///
    /// Set via SHEETVIEW_CREDENTIALS_PATH environment variable.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    /// Title of the sheet (tab) to display.
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,

    /// Column span read from the sheet, in A1 notation without the sheet name.
    #[serde(default = "default_range_columns")]
    pub range_columns: String,

    /// Sheets API base URL.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Address the HTTP server binds to.
    ///
    /// Set via SHEETVIEW_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,

    /// User-Agent string for Sheets API requests.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via SHEETVIEW_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Absolute lifetime of the cached sheet, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// First hour (inclusive) of the quiet window.
    #[serde(default)]
    pub quiet_hours_start: u32,

    /// Last hour (exclusive) of the quiet window.
    #[serde(default = "default_quiet_hours_end")]
    pub quiet_hours_end: u32,

    /// Offset from UTC, in minutes, used to evaluate quiet hours.
    #[serde(default)]
    pub quiet_hours_utc_offset_minutes: i32,

    /// Longest accepted `searchQuery`, in characters.
    #[serde(default = "default_max_query_len")]
    pub max_query_len: usize,
}

fn default_sheet_name() -> String {
    "Retailer Store".into()
}

fn default_range_columns() -> String {
    "A:F".into()
}

fn default_api_base_url() -> String {
    "https://sheets.googleapis.com/v4".into()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("./static")
}

fn default_user_agent() -> String {
    "sheetview/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_cache_ttl_secs() -> u64 {
    86_400 // 24h
}

fn default_quiet_hours_end() -> u32 {
    8
}

fn default_max_query_len() -> usize {
    200
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            credentials_path: None,
            sheet_name: default_sheet_name(),
            range_columns: default_range_columns(),
            api_base_url: default_api_base_url(),
            bind_addr: default_bind_addr(),
            static_dir: default_static_dir(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            cache_ttl_secs: default_cache_ttl_secs(),
            quiet_hours_start: 0,
            quiet_hours_end: default_quiet_hours_end(),
            quiet_hours_utc_offset_minutes: 0,
            max_query_len: default_max_query_len(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Cache lifetime as Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `SHEETVIEW_`
    /// 2. TOML file from `SHEETVIEW_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("SHEETVIEW_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("SHEETVIEW_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Spreadsheet id, required before any fetch.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the spreadsheet id is not set.
    pub fn require_spreadsheet_id(&self) -> Result<&str, ConfigError> {
        self.spreadsheet_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "spreadsheet_id".into(),
                hint: "Set SHEETVIEW_SPREADSHEET_ID environment variable".into(),
            })
    }

    /// Credentials file path, required before any fetch.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if the credentials path is not set.
    pub fn require_credentials_path(&self) -> Result<&std::path::Path, ConfigError> {
        self.credentials_path.as_deref().ok_or_else(|| ConfigError::Missing {
            field: "credentials_path".into(),
            hint: "Set SHEETVIEW_CREDENTIALS_PATH environment variable".into(),
        })
    }
}
