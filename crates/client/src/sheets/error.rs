//! Sheets API client error types.

use std::sync::Arc;

/// Errors from the Google Sheets API client.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    /// No credentials were configured.
    #[error("missing credentials: set SHEETVIEW_CREDENTIALS_PATH")]
    MissingCredentials,

    /// The credentials file could not be read or parsed.
    #[error("invalid credentials: {0}")]
    Credentials(String),

    /// Authentication or authorization failed.
    #[error("authentication failed: {0}")]
    AuthError(String),

    /// Rate limited by the Sheets API.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}{}", .message.as_deref().map(|m| format!(" ({m})")).unwrap_or_default())]
    HttpError { status: u16, message: Option<String> },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// The configured sheet is not part of the spreadsheet metadata.
    #[error("sheet not found: {0}")]
    SheetNotFound(String),

    /// The configured base URL or range does not form a valid request URL.
    #[error("invalid request URL: {0}")]
    InvalidUrl(String),
}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { SheetsError::Timeout } else { SheetsError::Network(Arc::new(err)) }
    }
}

impl From<url::ParseError> for SheetsError {
    fn from(err: url::ParseError) -> Self {
        SheetsError::InvalidUrl(err.to_string())
    }
}
