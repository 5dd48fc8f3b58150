use crate::config::Config;
use crate::error::Result;
use crate::index::{Filter, KeySource};
use crate::spreadsheet::cell::{Cell, CellValue};
use crate::spreadsheet::column::{ColumnLookup, ColumnType};
use crate::spreadsheet::SpreadsheetError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::warn;
use url::Url;

/// Represents a row of a sheet or report.
///
/// A row decoded from a payload is detached: its cells can only be reached by
/// column id. Once its table attaches it, the row keeps a shared reference to
/// the table's [`ColumnLookup`] and answers title-based lookups.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_id: Option<i64>,
    /// Sequential position of the row, starting at 1
    #[serde(rename = "rowNumber", skip_serializing_if = "Option::is_none")]
    pub num: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sibling_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cells: Vec<Cell>,

    #[serde(skip)]
    columns: Option<Arc<ColumnLookup>>,
    #[serde(skip)]
    cell_by_column_id: HashMap<i64, usize>,
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("num", &self.num)
            .finish()
    }
}

impl PartialEq for Row {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.num == other.num && self.cells == other.cells
    }
}

impl Row {
    /// Creates a detached row from cells, e.g. for adding to a sheet.
    pub fn new(cells: Vec<Cell>) -> Self {
        Row {
            cells,
            ..Default::default()
        }
    }

    /// Binds the row to its table's columns, typing cell values on the way:
    /// dates and datetimes are parsed, multi-picklist options are collected.
    pub(crate) fn attach(&mut self, columns: Arc<ColumnLookup>, config: &Config) -> Result<()> {
        self.cell_by_column_id.clear();
        for (position, cell) in self.cells.iter_mut().enumerate() {
            let Some(column_id) = cell.lookup_column_id() else {
                continue;
            };
            self.cell_by_column_id.insert(column_id, position);

            let Some(column) = columns.by_id(column_id) else {
                continue;
            };
            match column.kind {
                Some(ColumnType::MultiPicklist) if cell.value.is_none() => {
                    if let Some(values) = cell.multi_picklist_values() {
                        cell.value = Some(CellValue::List(values));
                    }
                }
                Some(kind) if kind.is_temporal() => {
                    let Some(value) = cell.value.take() else {
                        continue;
                    };
                    let title = column.title.as_deref().unwrap_or_default();
                    match value.clone().typed(kind) {
                        Ok(typed) => cell.value = Some(typed),
                        Err(message) if config.strict_cell_values => {
                            Err(SpreadsheetError::InvalidCellValue {
                                column: title.to_owned(),
                                message,
                            })?
                        }
                        Err(message) => {
                            warn!(
                                row_id = ?self.id,
                                column = %title,
                                %message,
                                "keeping raw cell value"
                            );
                            cell.value = Some(value);
                        }
                    }
                }
                _ => {}
            }
        }
        self.columns = Some(columns);
        Ok(())
    }

    fn lookup(&self) -> Result<&ColumnLookup> {
        self.columns
            .as_deref()
            .ok_or_else(|| SpreadsheetError::DetachedRow.into())
    }

    /// Returns the cell of the titled column, `None` if the row has no cell
    /// for it. Unknown titles are an error.
    pub fn get_cell(&self, column_title: &str) -> Result<Option<&Cell>> {
        let column_id = self.lookup()?.id_of(column_title)?;
        Ok(self.get_cell_by_id(column_id))
    }

    /// Returns the cell for a column id (virtual id for report rows).
    pub fn get_cell_by_id(&self, column_id: i64) -> Option<&Cell> {
        if self.columns.is_some() {
            self.cell_by_column_id
                .get(&column_id)
                .map(|position| &self.cells[*position])
        } else {
            self.cells
                .iter()
                .find(|cell| cell.lookup_column_id() == Some(column_id))
        }
    }

    /// Returns the value of the titled column, `None` for absent cells or
    /// empty values.
    pub fn value(&self, column_title: &str) -> Result<Option<&CellValue>> {
        Ok(self.get_cell(column_title)?.and_then(|cell| cell.value.as_ref()))
    }

    /// Returns a map of column title to cell value for every cell whose
    /// column is known.
    pub fn as_map(&self) -> BTreeMap<String, Option<CellValue>> {
        let Some(columns) = self.columns.as_deref() else {
            return BTreeMap::new();
        };
        self.cells
            .iter()
            .filter_map(|cell| {
                let column = columns.by_id(cell.lookup_column_id()?)?;
                let title = column.title.clone()?;
                Some((title, cell.value.clone()))
            })
            .collect()
    }

    /// Checks every filter entry against this row's values.
    pub fn matches(&self, filter: &Filter) -> Result<bool> {
        for (title, expected) in filter.iter() {
            if self.value(title)? != expected.as_ref() {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl KeySource for Row {
    fn key_value(&self, column_title: &str) -> Result<Option<&CellValue>> {
        self.value(column_title)
    }
}

/// Identifies a single row for direct or indexed lookup.
#[derive(Clone, Debug, PartialEq)]
pub enum RowSelector {
    ById(i64),
    ByPosition(u32),
    ByFilter(Filter),
}

impl RowSelector {
    /// Resolves optional lookup arguments into a selector. Exactly one of
    /// them must be given.
    pub fn from_parts(
        row_id: Option<i64>,
        row_num: Option<u32>,
        filter: Option<Filter>,
    ) -> Result<Self> {
        match (row_id, row_num, filter) {
            (Some(id), None, None) => Ok(RowSelector::ById(id)),
            (None, Some(num), None) => Ok(RowSelector::ByPosition(num)),
            (None, None, Some(filter)) => Ok(RowSelector::ByFilter(filter)),
            (None, None, None) => Err(SpreadsheetError::AmbiguousLookup {
                message: "either row id, row number or filter should be provided".to_owned(),
            })?,
            _ => Err(SpreadsheetError::AmbiguousLookup {
                message: "only one of row id, row number and filter should be provided".to_owned(),
            })?,
        }
    }
}

impl From<Filter> for RowSelector {
    fn from(filter: Filter) -> Self {
        RowSelector::ByFilter(filter)
    }
}
