//! Client code for sheetview.
//!
//! This crate provides the Google Sheets API client that implements the
//! `SheetSource` read capability consumed by the freshness policy.

pub mod sheets;

pub use sheets::{Credentials, GoogleSheetsClient, SheetsConfig, SheetsError, SpreadsheetMeta, ValueRange, a1_range};
