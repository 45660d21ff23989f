//! Unified error types for sheetview.
//!
//! Every variant renders with an upper-case code prefix so log lines stay
//! greppable. None of these are fatal to a request: the freshness policy
//! turns them into a user-visible message next to an empty table.

use crate::config::ConfigError;

/// Unified error types for sheet loading.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The spreadsheet API call failed (network, auth, malformed response).
    #[error("FETCH_ERROR: {0}")]
    Fetch(String),

    /// The fetch succeeded but nothing usable remained after truncation.
    #[error("EMPTY_DATA: {0}")]
    EmptyData(String),

    /// The row-count metadata lookup failed.
    #[error("METADATA_ERROR: {0}")]
    Metadata(String),

    /// Invalid input parameters (e.g., an oversized search query).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is invalid.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),
}

impl Error {
    /// Text shown in the page banner when a load fails.
    pub fn user_message(&self) -> String {
        match self {
            Error::Fetch(msg) | Error::Metadata(msg) => format!("Error: {msg}"),
            Error::EmptyData(msg) | Error::InvalidInput(msg) => msg.clone(),
            Error::Config(e) => format!("Error: {e}"),
        }
    }
}
