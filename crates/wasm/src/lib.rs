//! Browser-side table controller for the sheetview page.
//!
//! The server renders every sheet row once. This crate keeps the page
//! interactive without further requests: live search, the "show selected"
//! toggle, per-row quantities and totals, and a selection persisted to
//! `sessionStorage`.
//!
//! All state transitions live in plain Rust ([`TableViewController`]) and are
//! tested natively. The DOM binding is compiled only for `wasm32`.
//!
//! # Building
//!
//! ```bash
//! wasm-pack build crates/wasm --target web --out-dir ../../static/pkg
//! ```

#![forbid(unsafe_code)]

pub mod controller;
pub mod debounce;
pub mod money;
pub mod selection;

#[cfg(target_arch = "wasm32")]
mod wasm;

pub use controller::{Frame, RowModel, RowPatch, RowView, TableViewController};
pub use debounce::Debouncer;
pub use selection::{SelectionStore, SessionStorage, STORAGE_KEY};

/// Trailing delay shared by search filtering and selection persistence.
pub const DEBOUNCE_MS: u64 = 300;
