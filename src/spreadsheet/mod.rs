//! # Spreadsheet Module
//!
//! Typed view over sheet and report payloads: columns, rows and cells, the
//! title-based field mapping on top of column ids, and the [`Table`] that
//! holds rows together with their secondary indexes.
//!
//! Sheets and reports share the same table operations through the
//! [`Tabular`] trait; reports address columns and cells by virtual ids.
pub mod cell;
pub mod column;
pub mod report;
pub mod row;
pub mod sheet;
pub mod table;

pub use cell::{Cell, CellValue};
pub use column::{Column, ColumnLookup, ColumnSelector, ColumnType};
pub use report::{Report, ReportData, SourceSheet};
pub use row::{Row, RowSelector};
pub use sheet::{Sheet, SheetData};
pub use table::{Table, Tabular};

use thiserror::Error;

/// Errors raised while mapping rows and resolving lookups.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// No column carries the requested title or id
    #[error("Column '{title}' not found")]
    ColumnNotFound { title: String },

    /// A lookup was given none or more than one of its alternative arguments
    #[error("Ambiguous lookup: {message}")]
    AmbiguousLookup { message: String },

    /// Cell value cannot be converted to the column's type
    #[error("Invalid cell value at '{column}': {message}")]
    InvalidCellValue { column: String, message: String },

    #[error("Column '{title}' has no id")]
    MissingColumnId { title: String },

    /// Title-based access on a row that was never attached to its columns
    #[error("Row is not attached to any sheet or report")]
    DetachedRow,
}
