//! Sheets API response types.

use serde::Deserialize;
use serde_json::Value;

/// `spreadsheets.values.get` response.
///
/// The API omits `values` entirely when the range is empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueRange {
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub major_dimension: Option<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

/// `spreadsheets.get` response, restricted by the `fields` mask to sheet titles and row counts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpreadsheetMeta {
    #[serde(default)]
    pub sheets: Vec<SheetMeta>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SheetMeta {
    #[serde(default)]
    pub properties: Option<SheetProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetProperties {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub grid_properties: Option<GridProperties>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridProperties {
    #[serde(default)]
    pub row_count: Option<u32>,
}

impl SpreadsheetMeta {
    /// Grid row count of the sheet titled `title`.
    pub fn row_count_of(&self, title: &str) -> Option<u32> {
        self.sheets
            .iter()
            .filter_map(|s| s.properties.as_ref())
            .find(|p| p.title.as_deref() == Some(title))
            .and_then(|p| p.grid_properties.as_ref())
            .and_then(|g| g.row_count)
    }
}

/// Google API error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetail {
    #[serde(default)]
    pub code: Option<u16>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}
