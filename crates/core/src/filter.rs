//! Row filtering rules.
//!
//! - Truncation: rows are consumed until the first row whose column A is
//!   blank; that row and everything after it are dropped.
//! - Search: case-insensitive substring match on the SKU or title column.
//!   The header is always kept and the input table is never modified.

use serde_json::Value;

use crate::table::{ColumnMap, SheetRow, SheetTable, coerce_cell};

/// Truncate raw API rows at the first blank column-A cell.
///
/// A row with no cells at all is treated as blank.
pub fn truncate_at_blank(raw_rows: &[Vec<Value>]) -> SheetTable {
    let mut rows = Vec::with_capacity(raw_rows.len());
    for (index, raw) in raw_rows.iter().enumerate() {
        let first = raw.first().map(coerce_cell).unwrap_or_default();
        if first.trim().is_empty() {
            tracing::debug!(row = index, "stopped reading sheet rows at blank column A");
            break;
        }
        rows.push(SheetRow::from_raw(raw));
    }
    SheetTable::from_rows(rows)
}

/// Filter data rows by `query` against the SKU and title columns.
///
/// Empty or absent query returns an unchanged copy.
pub fn search(table: &SheetTable, query: Option<&str>, columns: &ColumnMap) -> SheetTable {
    let Some(query) = query.filter(|q| !q.is_empty()) else {
        return table.clone();
    };
    let needle = query.to_lowercase();

    let rows = table
        .rows
        .iter()
        .filter(|row| {
            row.cell(columns.sku).to_lowercase().contains(&needle)
                || row.cell(columns.title).to_lowercase().contains(&needle)
        })
        .cloned()
        .collect();

    SheetTable { header: table.header.clone(), rows }
}
