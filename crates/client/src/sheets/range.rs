//! A1 range notation for Sheets API requests.

/// Build `'Sheet Name'!A:F` from a sheet title and a column span.
///
/// The title is always quoted; embedded single quotes are doubled.
pub fn a1_range(sheet_name: &str, columns: &str) -> String {
    let escaped = sheet_name.replace('\'', "''");
    format!("'{escaped}'!{}", columns.trim())
}
