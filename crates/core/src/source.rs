//! The spreadsheet read capability.
//!
//! Implementations are bound to one spreadsheet, sheet and range at
//! construction, so the policy only asks for "the rows" and "the row count".

use serde_json::Value;

use crate::Error;

/// Read access to a single sheet.
#[async_trait::async_trait]
pub trait SheetSource: Send + Sync {
    /// Raw cell values of the configured range, row by row.
    async fn values(&self) -> Result<Vec<Vec<Value>>, Error>;

    /// Total grid row count from the sheet metadata.
    async fn row_count(&self) -> Result<u32, Error>;
}
