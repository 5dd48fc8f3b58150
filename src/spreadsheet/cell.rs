use crate::spreadsheet::column::ColumnType;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt::Display;
use std::hash::{Hash, Hasher};

/// Object type tag used by multi-picklist `objectValue` payloads.
pub(crate) const MULTI_PICKLIST: &str = "MULTI_PICKLIST";

/// Value held by a cell.
///
/// Values coming from the wire are decoded as booleans, numbers, strings or
/// string lists; dates and datetimes are produced when a row is attached to
/// columns of the matching type.
///
/// Equality and hashing are total so values can be used as index keys:
/// numbers compare by bit pattern, with `-0.0 == 0.0` and every NaN equal to
/// every other NaN.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Boolean(bool),
    Number(f64),
    Text(String),
    /// Selected options of a multi-picklist cell
    List(Vec<String>),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
}

impl CellValue {
    /// Returns the text if this is a `Text` value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CellValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Number(number) => Some(*number),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CellValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CellValue::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            CellValue::DateTime(datetime) => Some(*datetime),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            CellValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Converts a raw wire value to the representation of the given column
    /// type. Values that are already typed, or columns without a special
    /// representation, are returned unchanged.
    pub(crate) fn typed(self, kind: ColumnType) -> Result<Self, String> {
        match (kind, self) {
            (ColumnType::Date, CellValue::Text(text)) => {
                NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                    .map(CellValue::Date)
                    .map_err(|_| format!("parse '{}' to date failed", text))
            }
            (ColumnType::DateTime | ColumnType::AbstractDateTime, CellValue::Text(text)) => {
                DateTime::parse_from_rfc3339(&text)
                    .map(|datetime| CellValue::DateTime(datetime.with_timezone(&Utc)))
                    .or_else(|_| {
                        // ABSTRACT_DATETIME cells may carry a bare date
                        NaiveDate::parse_from_str(&text, "%Y-%m-%d").map(|date| {
                            CellValue::DateTime(date.and_time(NaiveTime::MIN).and_utc())
                        })
                    })
                    .map_err(|_| format!("parse '{}' to datetime failed", text))
            }
            (_, value) => Ok(value),
        }
    }

    /// Normalised number bits: `-0.0` folds into `0.0`, NaNs into one pattern.
    fn number_bits(number: f64) -> u64 {
        if number == 0.0 {
            0f64.to_bits()
        } else if number.is_nan() {
            f64::NAN.to_bits()
        } else {
            number.to_bits()
        }
    }
}

impl PartialEq for CellValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (CellValue::Boolean(a), CellValue::Boolean(b)) => a == b,
            (CellValue::Number(a), CellValue::Number(b)) => {
                Self::number_bits(*a) == Self::number_bits(*b)
            }
            (CellValue::Text(a), CellValue::Text(b)) => a == b,
            (CellValue::List(a), CellValue::List(b)) => a == b,
            (CellValue::Date(a), CellValue::Date(b)) => a == b,
            (CellValue::DateTime(a), CellValue::DateTime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for CellValue {}

impl Hash for CellValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Boolean(value) => value.hash(state),
            CellValue::Number(number) => Self::number_bits(*number).hash(state),
            CellValue::Text(text) => text.hash(state),
            CellValue::List(values) => values.hash(state),
            CellValue::Date(date) => date.hash(state),
            CellValue::DateTime(datetime) => datetime.hash(state),
        }
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Boolean(value) => write!(f, "{}", value),
            CellValue::Number(number) => write!(f, "{}", number),
            CellValue::Text(text) => write!(f, "{}", text),
            CellValue::List(values) => write!(f, "{}", values.join(", ")),
            CellValue::Date(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            CellValue::DateTime(datetime) => write!(f, "{}", datetime.to_rfc3339()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_owned())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Boolean(value)
    }
}

impl From<NaiveDate> for CellValue {
    fn from(value: NaiveDate) -> Self {
        CellValue::Date(value)
    }
}

impl From<DateTime<Utc>> for CellValue {
    fn from(value: DateTime<Utc>) -> Self {
        CellValue::DateTime(value)
    }
}

impl From<Vec<String>> for CellValue {
    fn from(values: Vec<String>) -> Self {
        CellValue::List(values)
    }
}

impl From<Vec<&str>> for CellValue {
    fn from(values: Vec<&str>) -> Self {
        CellValue::List(values.into_iter().map(str::to_owned).collect())
    }
}

/// Represents a single cell of a row.
///
/// Sheet cells reference their column through `column_id`; report cells
/// through `virtual_column_id`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_column_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_value: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_validation: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
}

impl Cell {
    /// Creates a plain cell for the given column.
    pub fn new(column_id: i64, value: impl Into<CellValue>) -> Self {
        Cell {
            column_id: Some(column_id),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// Creates a multi-picklist cell; the options travel in `objectValue`.
    pub fn multi_picklist<I, S>(column_id: i64, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        Cell {
            column_id: Some(column_id),
            object_value: Some(json!({
                "objectType": MULTI_PICKLIST,
                "values": values,
            })),
            ..Default::default()
        }
    }

    /// Column identifier used for lookups: the virtual id for report cells,
    /// the column id otherwise.
    pub fn lookup_column_id(&self) -> Option<i64> {
        self.virtual_column_id.or(self.column_id)
    }

    /// Options carried by a multi-picklist `objectValue`, if any.
    pub(crate) fn multi_picklist_values(&self) -> Option<Vec<String>> {
        let object = self.object_value.as_ref()?;
        if object.get("objectType")?.as_str()? != MULTI_PICKLIST {
            return None;
        }
        let values = object.get("values")?.as_array()?;
        Some(
            values
                .iter()
                .filter_map(|value| value.as_str().map(str::to_owned))
                .collect(),
        )
    }
}
