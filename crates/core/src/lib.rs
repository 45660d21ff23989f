//! Core types and shared functionality for sheetview.
//!
//! This crate provides:
//! - The sheet data model and row filtering rules
//! - The single-slot sheet cache and its freshness policy
//! - The `SheetSource` seam implemented by the Sheets API client
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod freshness;
pub mod source;
pub mod table;

pub use cache::{CacheEntry, SheetCache};
pub use clock::{Clock, SystemClock};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use freshness::{Decision, FreshnessPolicy, LoadOrigin, QuietHours, SheetLoad};
pub use source::SheetSource;
pub use table::{ColumnMap, SheetRow, SheetTable, row_key, row_keys};
