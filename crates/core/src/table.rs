//! Sheet data model.
//!
//! A sheet is read as a header row followed by data rows. Cells are always
//! strings; the raw JSON values returned by the API are coerced on the way in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex characters kept from the row-key digest.
const ROW_KEY_LEN: usize = 16;

/// One sheet row: cell values in column order (A, B, C, ...).
///
/// Rows are ragged; a row holds only as many cells as the API returned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SheetRow(pub Vec<String>);

impl SheetRow {
    /// Build a row from raw API cell values.
    pub fn from_raw(cells: &[Value]) -> Self {
        Self(cells.iter().map(coerce_cell).collect())
    }

    /// Cell at `index`, or `""` when the row is shorter.
    pub fn cell(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }

    pub fn cells(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SheetRow {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Coerce a raw cell to its display string. Null becomes `""`.
pub fn coerce_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Header row plus data rows.
///
/// The header never takes part in search filtering or totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTable {
    pub header: Option<SheetRow>,
    pub rows: Vec<SheetRow>,
}

impl SheetTable {
    /// Split a flat row list into header (first row) and data rows.
    pub fn from_rows(rows: Vec<SheetRow>) -> Self {
        let mut iter = rows.into_iter();
        let header = iter.next();
        Self { header, rows: iter.collect() }
    }

    /// Flatten back to header-first row order.
    pub fn to_rows(&self) -> Vec<SheetRow> {
        self.header.iter().chain(self.rows.iter()).cloned().collect()
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when there is neither a header nor any data row.
    pub fn is_empty(&self) -> bool {
        self.header.is_none() && self.rows.is_empty()
    }
}

/// Which columns hold the product fields used by search and totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMap {
    pub sku: usize,
    pub title: usize,
    pub unit_price: usize,
}

impl ColumnMap {
    pub const DEFAULT: ColumnMap = ColumnMap { sku: 0, title: 1, unit_price: 2 };

    /// Lowercased text the client matches search input against.
    pub fn search_text(&self, row: &SheetRow) -> String {
        format!("{}\n{}", row.cell(self.sku), row.cell(self.title)).to_lowercase()
    }
}

impl Default for ColumnMap {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Stable identifier for a selectable row.
///
/// Derived from the SKU and title cells only, so a persisted selection
/// survives price edits in the sheet.
pub fn row_key(row: &SheetRow, columns: &ColumnMap) -> String {
    let mut hasher = Sha256::new();
    hasher.update(row.cell(columns.sku).as_bytes());
    hasher.update(b"\n");
    hasher.update(row.cell(columns.title).as_bytes());
    let mut key = hex::encode(hasher.finalize());
    key.truncate(ROW_KEY_LEN);
    key
}

/// Selection ids for `rows`, unique within the slice.
///
/// The first row with a given SKU and title gets its plain [`row_key`]; later
/// repeats get `-2`, `-3`, ... appended in sheet order.
pub fn row_keys(rows: &[SheetRow], columns: &ColumnMap) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    rows.iter()
        .map(|row| {
            let key = row_key(row, columns);
            let count = seen.entry(key.clone()).or_insert(0);
            *count += 1;
            if *count == 1 { key } else { format!("{key}-{count}") }
        })
        .collect()
}
