//! Row visibility, selection and totals as a pure state machine.
//!
//! Events mutate the controller; [`TableViewController::render`] derives the
//! desired view of every row and returns only the rows whose view changed
//! since the previous render.

use crate::DEBOUNCE_MS;
use crate::debounce::Debouncer;
use crate::money::{format_currency, format_quantity, parse_quantity, parse_unit_price, positive_quantity};
use crate::selection::{SelectionStore, SessionStorage};

/// Static facts about a rendered row plus its quantity input.
#[derive(Debug, Clone, PartialEq)]
pub struct RowModel {
    /// Selection id (checkbox value).
    pub id: String,
    /// Lowercased text the live search matches against.
    pub search_text: String,
    /// `data-unit-price`; `None` when the attribute is absent.
    pub unit_price: Option<String>,
    pub quantity: String,
}

impl RowModel {
    pub fn new(id: impl Into<String>, search_text: &str, unit_price: Option<&str>) -> Self {
        Self {
            id: id.into(),
            search_text: search_text.to_lowercase(),
            unit_price: unit_price.map(str::to_string),
            quantity: String::new(),
        }
    }

    fn line_total(&self) -> Option<f64> {
        let quantity = positive_quantity(&self.quantity)?;
        let unit_price = parse_unit_price(self.unit_price.as_deref()?)?;
        Some(quantity * unit_price)
    }

    /// Text of the total cell: blank without a positive quantity, `N/A`
    /// without a usable unit price.
    fn total_text(&self) -> String {
        if positive_quantity(&self.quantity).is_none() {
            return String::new();
        }
        self.line_total().map(format_currency).unwrap_or_else(|| "N/A".to_string())
    }
}

/// Desired DOM state of one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowView {
    pub visible: bool,
    pub checked: bool,
    pub quantity: String,
    pub total: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowPatch {
    pub index: usize,
    pub view: RowView,
}

/// Result of one render pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub patches: Vec<RowPatch>,
    pub selected_count: usize,
    pub grand_total: String,
}

pub struct TableViewController<S> {
    rows: Vec<RowModel>,
    search_input: String,
    search: String,
    show_selected: bool,
    selection: SelectionStore<S>,
    search_timer: Debouncer,
    rendered: Vec<Option<RowView>>,
}

impl<S: SessionStorage> TableViewController<S> {
    /// `initial_search` is the value the server pre-filled into the search box.
    ///
    /// Restored selection and restored quantities are reconciled at `now`:
    /// a selected row without a positive quantity gets quantity 1, and an
    /// unselected row with a positive quantity is selected.
    pub fn new(rows: Vec<RowModel>, selection: SelectionStore<S>, initial_search: &str, now: u64) -> Self {
        let rendered = vec![None; rows.len()];
        let mut controller = Self {
            rows,
            search_input: initial_search.to_string(),
            search: normalize(initial_search),
            show_selected: false,
            selection,
            search_timer: Debouncer::new(DEBOUNCE_MS),
            rendered,
        };
        controller.reconcile(now);
        controller
    }

    fn reconcile(&mut self, now: u64) {
        for row in &mut self.rows {
            let positive = positive_quantity(&row.quantity).is_some();
            if self.selection.has(&row.id) {
                if !positive {
                    row.quantity = "1".to_string();
                }
            } else if positive {
                self.selection.add(&row.id, now);
            }
        }
    }

    pub fn rows(&self) -> &[RowModel] {
        &self.rows
    }

    pub fn selection(&self) -> &SelectionStore<S> {
        &self.selection
    }

    pub fn show_selected(&self) -> bool {
        self.show_selected
    }

    /// The search box changed; filtering follows after the debounce delay.
    pub fn set_search_input(&mut self, text: &str, now: u64) {
        self.search_input = text.to_string();
        self.search_timer.schedule(now);
    }

    /// Apply the typed search text.
    pub fn search_due(&mut self) {
        self.search_timer.cancel();
        self.search = normalize(&self.search_input);
    }

    pub fn set_show_selected(&mut self, on: bool) {
        self.show_selected = on;
    }

    /// The user checked or unchecked a row's checkbox.
    ///
    /// Checking without a positive quantity sets it to 1. Unchecking clears it.
    pub fn toggle_checkbox(&mut self, index: usize, checked: bool, now: u64) {
        let Some(row) = self.rows.get_mut(index) else { return };
        if checked {
            if positive_quantity(&row.quantity).is_none() {
                row.quantity = "1".to_string();
            }
            self.selection.add(&row.id, now);
        } else {
            row.quantity.clear();
            self.selection.remove(&row.id, now);
        }
    }

    /// The user edited a quantity. A positive quantity selects the row,
    /// anything else deselects it.
    pub fn set_quantity(&mut self, index: usize, text: &str, now: u64) {
        let Some(row) = self.rows.get_mut(index) else { return };
        row.quantity = text.to_string();

        let checked = self.selection.has(&row.id);
        let positive = positive_quantity(text).is_some();
        if positive && !checked {
            self.selection.add(&row.id, now);
        } else if !positive && checked {
            self.selection.remove(&row.id, now);
        }
    }

    /// A click on the row body: selects an unselected row, otherwise adds one
    /// to its quantity.
    pub fn click_row(&mut self, index: usize, now: u64) {
        let Some(row) = self.rows.get(index) else { return };
        if !self.selection.has(&row.id) {
            self.toggle_checkbox(index, true, now);
            return;
        }

        let current = parse_quantity(&row.quantity).filter(|q| *q >= 1.0).unwrap_or(0.0);
        let next = format_quantity(current + 1.0);
        self.set_quantity(index, &next, now);
    }

    /// Clear every selection and quantity and switch "show selected" off.
    pub fn unselect_all(&mut self, now: u64) {
        self.selection.clear(now);
        for row in &mut self.rows {
            row.quantity.clear();
        }
        self.show_selected = false;
    }

    /// Advance both timers. Returns true when the view may have changed.
    pub fn tick(&mut self, now: u64) -> bool {
        self.selection.flush_if_due(now);
        if self.search_timer.fire_if_due(now) {
            self.search_due();
            true
        } else {
            false
        }
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.search_timer.deadline(), self.selection.save_deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Persist any pending selection change immediately.
    pub fn flush(&mut self) {
        self.selection.flush_now();
    }

    pub fn view_of(&self, index: usize) -> Option<RowView> {
        self.rows.get(index).map(|row| self.view(row))
    }

    pub fn render(&mut self) -> Frame {
        let mut patches = Vec::new();
        let mut grand_total = 0.0;

        for (index, row) in self.rows.iter().enumerate() {
            let view = self.view(row);
            if view.visible
                && let Some(total) = row.line_total()
            {
                grand_total += total;
            }
            if self.rendered[index].as_ref() != Some(&view) {
                self.rendered[index] = Some(view.clone());
                patches.push(RowPatch { index, view });
            }
        }

        Frame { patches, selected_count: self.selection.len(), grand_total: format_currency(grand_total) }
    }

    fn view(&self, row: &RowModel) -> RowView {
        let checked = self.selection.has(&row.id);
        let matches = !self.search.is_empty() && row.search_text.contains(&self.search);
        let visible = if self.show_selected {
            checked || matches
        } else {
            self.search.is_empty() || matches
        };

        RowView { visible, checked, quantity: row.quantity.clone(), total: row.total_text() }
    }
}

fn normalize(query: &str) -> String {
    query.to_lowercase()
}
