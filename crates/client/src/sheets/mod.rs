//! Google Sheets v4 REST client.
//!
//! Implements the `SheetSource` read capability against one spreadsheet tab.
//!
//! ### Endpoints
//! - **Values**: `GET {base}/spreadsheets/{id}/values/{'Sheet'!A:F}`
//! - **Row count**: `GET {base}/spreadsheets/{id}?fields=sheets.properties.title,sheets.properties.gridProperties.rowCount`
//!
//! ### Authentication
//! - API key: sent as the `key` query parameter.
//! - Access token: sent as `Authorization: Bearer`.
//!
//! Every request carries the configured timeout; there is no retry.

pub mod error;
pub mod range;
pub mod response;

pub use error::SheetsError;
pub use range::a1_range;
pub use response::{SpreadsheetMeta, ValueRange};

use std::path::Path;
use std::time::{Duration, Instant};

use reqwest::{StatusCode, header};
use serde::Deserialize;
use serde_json::Value;
use sheetview_core::{AppConfig, Error, SheetSource};
use url::Url;

/// Default Sheets API base URL.
const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// Default request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default user agent.
const DEFAULT_USER_AGENT: &str = "sheetview/0.1";

/// Field mask for the metadata request.
const ROW_COUNT_FIELDS: &str = "sheets.properties.title,sheets.properties.gridProperties.rowCount";

/// How requests authenticate.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    ApiKey(String),
    AccessToken(String),
}

#[derive(Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

impl Credentials {
    /// Parse `{"api_key": "..."}` or `{"access_token": "..."}`.
    pub fn from_json(json: &str) -> Result<Self, SheetsError> {
        let file: CredentialsFile = serde_json::from_str(json).map_err(|e| SheetsError::Credentials(e.to_string()))?;
        let non_empty = |s: Option<String>| s.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        match (non_empty(file.api_key), non_empty(file.access_token)) {
            (Some(key), None) => Ok(Credentials::ApiKey(key)),
            (None, Some(token)) => Ok(Credentials::AccessToken(token)),
            (Some(_), Some(_)) => Err(SheetsError::Credentials("set only one of api_key or access_token".into())),
            (None, None) => Err(SheetsError::MissingCredentials),
        }
    }

    /// Read credentials from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SheetsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| SheetsError::Credentials(format!("{}: {e}", path.display())))?;
        Self::from_json(&json)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::ApiKey(_) => f.write_str("ApiKey(<redacted>)"),
            Credentials::AccessToken(_) => f.write_str("AccessToken(<redacted>)"),
        }
    }
}

/// Sheets client configuration.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    /// Base URL (default: https://sheets.googleapis.com/v4).
    pub base_url: String,
    pub spreadsheet_id: String,
    /// Tab title, also used to pick the row count out of the metadata.
    pub sheet_name: String,
    /// Column span, e.g. `A:F`.
    pub range_columns: String,
    /// Request timeout (default: 20s).
    pub timeout: Duration,
    /// User-agent string (default: sheetview/0.x).
    pub user_agent: String,
    pub credentials: Credentials,
}

impl SheetsConfig {
    pub fn new(spreadsheet_id: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: "Retailer Store".to_string(),
            range_columns: "A:F".to_string(),
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            credentials,
        }
    }

    /// Build from application configuration, reading the credentials file.
    pub fn from_app_config(config: &AppConfig) -> Result<Self, Error> {
        let spreadsheet_id = config.require_spreadsheet_id()?;
        let credentials_path = config.require_credentials_path()?;
        let credentials = Credentials::from_file(credentials_path).map_err(|e| Error::InvalidInput(e.to_string()))?;

        Ok(Self {
            base_url: config.api_base_url.clone(),
            spreadsheet_id: spreadsheet_id.to_string(),
            sheet_name: config.sheet_name.clone(),
            range_columns: config.range_columns.clone(),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
            credentials,
        })
    }
}

/// Google Sheets API client bound to one spreadsheet tab.
#[derive(Debug, Clone)]
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    config: SheetsConfig,
}

impl GoogleSheetsClient {
    /// Create a new client with the given configuration.
    pub fn new(config: SheetsConfig) -> Result<Self, SheetsError> {
        let http = reqwest::Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .use_rustls_tls()
            .gzip(true)
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config(&self) -> &SheetsConfig {
        &self.config
    }

    fn spreadsheet_url(&self) -> Result<Url, SheetsError> {
        let mut url = Url::parse(&self.config.base_url)?;
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(format!("base URL cannot have a path: {}", self.config.base_url)))?
            .pop_if_empty()
            .push("spreadsheets")
            .push(&self.config.spreadsheet_id);
        Ok(url)
    }

    /// URL of the values request for the configured range.
    pub fn values_url(&self) -> Result<Url, SheetsError> {
        let mut url = self.spreadsheet_url()?;
        let range = a1_range(&self.config.sheet_name, &self.config.range_columns);
        url.path_segments_mut()
            .map_err(|_| SheetsError::InvalidUrl(self.config.base_url.clone()))?
            .push("values")
            .push(&range);
        Ok(url)
    }

    /// URL of the metadata request, masked to titles and row counts.
    pub fn metadata_url(&self) -> Result<Url, SheetsError> {
        let mut url = self.spreadsheet_url()?;
        url.query_pairs_mut().append_pair("fields", ROW_COUNT_FIELDS);
        Ok(url)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, mut url: Url) -> Result<T, SheetsError> {
        let mut request = match &self.config.credentials {
            Credentials::ApiKey(key) => {
                url.query_pairs_mut().append_pair("key", key);
                self.http.get(url)
            }
            Credentials::AccessToken(token) => self.http.get(url).bearer_auth(token),
        };
        request = request.header(header::ACCEPT, "application/json");

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("Sheets API response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| SheetsError::Parse(e.to_string()))
    }

    /// Read the raw cell values of the configured range.
    pub async fn fetch_values(&self) -> Result<Vec<Vec<Value>>, SheetsError> {
        let start = Instant::now();
        let range: ValueRange = self.get_json(self.values_url()?).await?;
        tracing::debug!("values fetched in {:?}, {} rows", start.elapsed(), range.values.len());
        Ok(range.values)
    }

    /// Read the grid row count of the configured sheet.
    pub async fn fetch_row_count(&self) -> Result<u32, SheetsError> {
        let meta: SpreadsheetMeta = self.get_json(self.metadata_url()?).await?;
        meta.row_count_of(&self.config.sheet_name).ok_or_else(|| {
            tracing::warn!(
                sheet = %self.config.sheet_name,
                spreadsheet = %self.config.spreadsheet_id,
                "sheet or its row count missing from spreadsheet metadata"
            );
            SheetsError::SheetNotFound(self.config.sheet_name.clone())
        })
    }
}

/// Map a non-success status and its body to an error.
fn status_error(status: StatusCode, body: &str) -> SheetsError {
    let message = serde_json::from_str::<response::ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error.message);

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SheetsError::AuthError(message.unwrap_or_else(|| status.to_string()))
        }
        StatusCode::TOO_MANY_REQUESTS => SheetsError::RateLimited,
        _ => SheetsError::HttpError { status: status.as_u16(), message },
    }
}

#[async_trait::async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn values(&self) -> Result<Vec<Vec<Value>>, Error> {
        self.fetch_values().await.map_err(|e| Error::Fetch(e.to_string()))
    }

    async fn row_count(&self) -> Result<u32, Error> {
        self.fetch_row_count().await.map_err(|e| Error::Metadata(e.to_string()))
    }
}
