//! # Rusty Smartsheet
//!
//! Typed access to Smartsheet sheets and reports with in-memory secondary
//! indexes over their rows.
//!
//! ## Features
//!
//! - **Field-name mapping**: Read and write cells by column title instead of
//!   column id, for both sheets and reports (virtual ids)
//! - **Typed cell values**: Dates, datetimes and multi-picklists are decoded
//!   into proper values
//! - **Custom indexes**: Build unique or non-unique composite-key indexes and
//!   look rows up by a filter of column values
//! - **Configurable strictness**: Duplicate keys and malformed cell values can
//!   fail fast or be tolerated
//!
//! ## Example
//!
//! ```no_run
//! use rusty_smartsheet::{Filter, IndexSpec, Sheet, Tabular};
//!
//! # fn main() -> rusty_smartsheet::Result<()> {
//! # let json = "{}";
//! let mut sheet = Sheet::from_json(json)?;
//! sheet.build_index(vec![
//!     IndexSpec::unique(["Email address"]),
//!     IndexSpec::non_unique(["Company"]),
//! ])?;
//! let row = sheet.get_row(Filter::new().with("Email address", "bob.lee@acme.com"))?;
//! let rows = sheet.get_rows(&Filter::new().with("Company", "ACME"))?;
//! # Ok(())
//! # }
//! ```
pub mod config;
pub mod error;
pub mod index;
pub mod spreadsheet;

pub use config::{Config, DuplicateKeyPolicy};
pub use error::{Result, ResultMessage, RustySmartsheetError};
pub use index::{Filter, IndexError, IndexKey, IndexSpec, RowIndexes};
pub use spreadsheet::{
    Cell, CellValue, Column, ColumnLookup, ColumnSelector, ColumnType, Report, ReportData, Row,
    RowSelector, Sheet, SheetData, SourceSheet, SpreadsheetError, Table, Tabular,
};
