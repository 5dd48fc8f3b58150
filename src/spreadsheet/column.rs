use crate::error::Result;
use crate::spreadsheet::SpreadsheetError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::info;

/// Column types known to the API.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    TextNumber,
    Picklist,
    MultiPicklist,
    Checkbox,
    Date,
    #[serde(rename = "DATETIME")]
    DateTime,
    #[serde(rename = "ABSTRACT_DATETIME")]
    AbstractDateTime,
    ContactList,
    MultiContactList,
    Duration,
    Predecessor,
    /// Any type this library does not model
    #[serde(other)]
    Other,
}

impl ColumnType {
    /// Returns the wire representation of the column type.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ColumnType::TextNumber => "TEXT_NUMBER",
            ColumnType::Picklist => "PICKLIST",
            ColumnType::MultiPicklist => "MULTI_PICKLIST",
            ColumnType::Checkbox => "CHECKBOX",
            ColumnType::Date => "DATE",
            ColumnType::DateTime => "DATETIME",
            ColumnType::AbstractDateTime => "ABSTRACT_DATETIME",
            ColumnType::ContactList => "CONTACT_LIST",
            ColumnType::MultiContactList => "MULTI_CONTACT_LIST",
            ColumnType::Duration => "DURATION",
            ColumnType::Predecessor => "PREDECESSOR",
            ColumnType::Other => "OTHER",
        }
    }

    /// Parses a column type from its wire name (case-insensitive).
    /// Unknown names map to `Other`.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "TEXT_NUMBER" => Self::TextNumber,
            "PICKLIST" => Self::Picklist,
            "MULTI_PICKLIST" => Self::MultiPicklist,
            "CHECKBOX" => Self::Checkbox,
            "DATE" => Self::Date,
            "DATETIME" => Self::DateTime,
            "ABSTRACT_DATETIME" => Self::AbstractDateTime,
            "CONTACT_LIST" => Self::ContactList,
            "MULTI_CONTACT_LIST" => Self::MultiContactList,
            "DURATION" => Self::Duration,
            "PREDECESSOR" => Self::Predecessor,
            _ => Self::Other,
        }
    }

    /// Returns true if cells of this type hold dates or datetimes.
    #[inline]
    pub fn is_temporal(&self) -> bool {
        matches!(
            self,
            ColumnType::Date | ColumnType::DateTime | ColumnType::AbstractDateTime
        )
    }
}

/// Represents a column of a sheet or report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Report-level identifier; reports address columns by this id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ColumnType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_column_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheet_name_column: Option<bool>,
}

impl Column {
    pub fn new(id: i64, title: impl Into<String>, kind: ColumnType) -> Self {
        Column {
            id: Some(id),
            title: Some(title.into()),
            kind: Some(kind),
            ..Default::default()
        }
    }

    /// Identifier used for lookups: the virtual id for report columns, the
    /// column id otherwise.
    pub fn lookup_id(&self) -> Option<i64> {
        self.virtual_id.or(self.id)
    }
}

/// Selects a column either by title or by id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnSelector {
    ByTitle(String),
    ById(i64),
}

impl ColumnSelector {
    /// Resolves optional arguments into a selector. Exactly one must be given.
    pub fn from_parts(title: Option<&str>, id: Option<i64>) -> Result<Self> {
        match (title, id) {
            (Some(title), None) => Ok(ColumnSelector::ByTitle(title.to_owned())),
            (None, Some(id)) => Ok(ColumnSelector::ById(id)),
            (None, None) => Err(SpreadsheetError::AmbiguousLookup {
                message: "either column title or column id should be provided".to_owned(),
            })?,
            (Some(_), Some(_)) => Err(SpreadsheetError::AmbiguousLookup {
                message: "only one of column title and column id should be provided".to_owned(),
            })?,
        }
    }
}

impl From<&str> for ColumnSelector {
    fn from(title: &str) -> Self {
        ColumnSelector::ByTitle(title.to_owned())
    }
}

impl From<i64> for ColumnSelector {
    fn from(id: i64) -> Self {
        ColumnSelector::ById(id)
    }
}

/// Title and id lookup over the columns of one sheet or report.
///
/// Shared by the table and every row attached to it. Columns without an id
/// are kept but cannot be resolved; for duplicate titles the last column wins.
#[derive(Debug, Default)]
pub struct ColumnLookup {
    columns: Vec<Column>,
    by_title: HashMap<String, usize>,
    by_id: HashMap<i64, usize>,
}

impl ColumnLookup {
    pub fn new(columns: Vec<Column>) -> Self {
        let mut by_title = HashMap::new();
        let mut by_id = HashMap::new();
        for (position, column) in columns.iter().enumerate() {
            let Some(id) = column.lookup_id() else {
                continue;
            };
            by_id.insert(id, position);

            let Some(title) = &column.title else {
                continue;
            };
            if by_title.insert(title.clone(), position).is_some() {
                info!(
                    title = %title,
                    "column title is already present in the lookup, last one wins"
                );
            }
        }
        ColumnLookup {
            columns,
            by_title,
            by_id,
        }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn contains_title(&self, title: &str) -> bool {
        self.by_title.contains_key(title)
    }

    pub fn by_title(&self, title: &str) -> Option<&Column> {
        self.by_title.get(title).map(|position| &self.columns[*position])
    }

    pub fn by_id(&self, id: i64) -> Option<&Column> {
        self.by_id.get(&id).map(|position| &self.columns[*position])
    }

    /// Resolves a title to its lookup id, failing for unknown titles.
    pub fn id_of(&self, title: &str) -> Result<i64> {
        self.by_title(title)
            .and_then(Column::lookup_id)
            .ok_or_else(|| {
                SpreadsheetError::ColumnNotFound {
                    title: title.to_owned(),
                }
                .into()
            })
    }

    /// Finds a column by selector; unknown titles and ids are errors.
    pub fn get(&self, selector: &ColumnSelector) -> Result<&Column> {
        match selector {
            ColumnSelector::ByTitle(title) => self.by_title(title).ok_or_else(|| {
                SpreadsheetError::ColumnNotFound {
                    title: title.clone(),
                }
                .into()
            }),
            ColumnSelector::ById(id) => self.by_id(*id).ok_or_else(|| {
                SpreadsheetError::ColumnNotFound {
                    title: format!("#{}", id),
                }
                .into()
            }),
        }
    }
}
