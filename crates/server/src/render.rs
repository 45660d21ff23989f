//! Page rendering for the sheet view.
//!
//! Templates are embedded at compile time and rendered with HTML auto-escaping.

use std::sync::LazyLock;

use minijinja::{AutoEscape, Environment, Error};
use serde::Serialize;
use sheetview_core::{ColumnMap, SheetRow, SheetTable, row_keys};

const SHEET_DATA_TEMPLATE: &str = "sheet_data.html";

static ENV: LazyLock<Environment<'static>> = LazyLock::new(|| {
    let mut env = Environment::new();
    env.set_auto_escape_callback(|name| if name.ends_with(".html") { AutoEscape::Html } else { AutoEscape::None });
    if let Err(err) = env.add_template(SHEET_DATA_TEMPLATE, include_str!("../templates/sheet_data.html")) {
        tracing::error!(error = %err, "failed to compile page template");
    }
    env
});

/// One rendered cell.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CellView {
    pub text: String,
    /// Set when the cell holds an http(s) URL.
    pub href: Option<String>,
}

/// One rendered data row with the attributes the browser controller reads.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RowView {
    pub id: String,
    pub unit_price: String,
    pub search_text: String,
    pub cells: Vec<CellView>,
}

/// Everything the page template needs.
#[derive(Debug, Clone, Serialize)]
pub struct SheetPage {
    pub title: String,
    pub search_query: Option<String>,
    pub message: Option<String>,
    pub header: Option<Vec<String>>,
    pub rows: Vec<RowView>,
    pub column_count: usize,
}

impl SheetPage {
    pub fn build(
        title: &str, table: &SheetTable, columns: &ColumnMap, search_query: Option<&str>, message: Option<String>,
    ) -> Self {
        let header = table.header.as_ref().map(|h| h.cells().to_vec());
        let widest_row = table.rows.iter().map(SheetRow::len).max().unwrap_or(0);
        let column_count = header.as_ref().map_or(0, Vec::len).max(widest_row);
        let header = header.map(|mut cells| {
            cells.resize(column_count, String::new());
            cells
        });

        let rows = table
            .rows
            .iter()
            .zip(row_keys(&table.rows, columns))
            .map(|(row, id)| RowView {
                id,
                unit_price: row.cell(columns.unit_price).to_string(),
                search_text: columns.search_text(row),
                cells: (0..column_count).map(|i| cell_view(row.cell(i))).collect(),
            })
            .collect();

        Self {
            title: title.to_string(),
            search_query: search_query.filter(|q| !q.is_empty()).map(str::to_string),
            message,
            header,
            rows,
            column_count,
        }
    }

    pub fn render(&self) -> Result<String, Error> {
        ENV.get_template(SHEET_DATA_TEMPLATE)?.render(self)
    }
}

fn cell_view(text: &str) -> CellView {
    let trimmed = text.trim();
    let is_link = trimmed.starts_with("https://") || trimmed.starts_with("http://");
    CellView { text: text.to_string(), href: is_link.then(|| trimmed.to_string()) }
}
