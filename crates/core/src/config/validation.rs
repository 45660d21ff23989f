//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::AppConfig;
use thiserror::Error;

/// Largest real-world UTC offset (+14:00), in minutes.
const MAX_UTC_OFFSET_MINUTES: i32 = 14 * 60;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

fn invalid(field: &str, reason: &str) -> ConfigError {
    ConfigError::Invalid { field: field.into(), reason: reason.into() }
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `timeout_ms` is less than 100ms or exceeds 5 minutes
    /// - `cache_ttl_secs` is 0
    /// - the quiet window is not `start < end <= 24`
    /// - `quiet_hours_utc_offset_minutes` is outside ±14h
    /// - `sheet_name`, `range_columns` or `user_agent` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_ms < 100 {
            return Err(invalid("timeout_ms", "must be at least 100ms"));
        }
        if self.timeout_ms > 300_000 {
            return Err(invalid("timeout_ms", "must not exceed 5 minutes (300000ms)"));
        }

        if self.cache_ttl_secs == 0 {
            return Err(invalid("cache_ttl_secs", "must be greater than 0"));
        }

        if self.quiet_hours_end > 24 {
            return Err(invalid("quiet_hours_end", "must not exceed 24"));
        }
        if self.quiet_hours_start >= self.quiet_hours_end {
            return Err(invalid("quiet_hours_start", "must be before quiet_hours_end"));
        }

        if self.quiet_hours_utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(invalid("quiet_hours_utc_offset_minutes", "must be within ±840 minutes"));
        }

        if self.sheet_name.trim().is_empty() {
            return Err(invalid("sheet_name", "must not be empty"));
        }
        if self.range_columns.trim().is_empty() {
            return Err(invalid("range_columns", "must not be empty"));
        }
        if self.user_agent.is_empty() {
            return Err(invalid("user_agent", "must not be empty"));
        }

        if self.max_query_len == 0 {
            tracing::warn!("max_query_len is 0; every non-empty search will be rejected");
        }

        Ok(())
    }
}
