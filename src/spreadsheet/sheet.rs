use crate::config::Config;
use crate::error::{Result, ResultMessage};
use crate::spreadsheet::cell::{Cell, CellValue};
use crate::spreadsheet::column::{Column, ColumnType};
use crate::spreadsheet::row::Row;
use crate::spreadsheet::table::{Table, Tabular};
use crate::spreadsheet::SpreadsheetError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Sheet payload as decoded from the API.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_row_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Represents a sheet with its rows attached to its columns.
#[derive(Clone, Debug)]
pub struct Sheet {
    pub id: Option<i64>,
    pub name: String,
    pub access_level: Option<String>,
    pub permalink: Option<Url>,
    pub favorite: Option<bool>,
    pub read_only: Option<bool>,
    pub version: Option<i64>,
    pub total_row_count: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    table: Table,
}

impl Sheet {
    /// Creates a sheet from decoded data with the default configuration.
    pub fn new(data: SheetData) -> Result<Self> {
        Self::with_config(data, Config::default())
    }

    pub fn with_config(data: SheetData, config: Config) -> Result<Self> {
        let table = Table::new(data.columns, data.rows, config)?;
        Ok(Sheet {
            id: data.id,
            name: data.name,
            access_level: data.access_level,
            permalink: data.permalink,
            favorite: data.favorite,
            read_only: data.read_only,
            version: data.version,
            total_row_count: data.total_row_count,
            created_at: data.created_at,
            modified_at: data.modified_at,
            table,
        })
    }

    /// Decodes a sheet from the JSON body of a sheet response.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_config(json, Config::default())
    }

    pub fn from_json_with_config(json: &str, config: Config) -> Result<Self> {
        let data: Result<SheetData> = serde_json::from_str(json).map_err(Into::into);
        let data = data.with_prefix("Decode sheet failed")?;
        let name = data.name.clone();
        Self::with_config(data, config).with_prefix(&format!("Load sheet '{}' failed", name))
    }

    /// Creates a cell for an existing column.
    ///
    /// Multi-picklist columns take their options in the cell's object value;
    /// a single text value is treated as a one-option list.
    pub fn make_cell(&self, column_title: &str, value: impl Into<CellValue>) -> Result<Cell> {
        let column = self.table.column_lookup().by_title(column_title).ok_or_else(|| {
            SpreadsheetError::ColumnNotFound {
                title: column_title.to_owned(),
            }
        })?;
        let Some(column_id) = column.id else {
            return Err(SpreadsheetError::MissingColumnId {
                title: column_title.to_owned(),
            }
            .into());
        };
        match (column.kind, value.into()) {
            (Some(ColumnType::MultiPicklist), CellValue::List(values)) => {
                Ok(Cell::multi_picklist(column_id, values))
            }
            (Some(ColumnType::MultiPicklist), CellValue::Text(value)) => {
                Ok(Cell::multi_picklist(column_id, [value]))
            }
            (Some(ColumnType::MultiPicklist), value) => Err(SpreadsheetError::InvalidCellValue {
                column: column_title.to_owned(),
                message: format!(
                    "multi-picklist column expects a list of options, got '{}'",
                    value
                ),
            })?,
            (_, value) => Ok(Cell::new(column_id, value)),
        }
    }

    /// Creates cells from column title and value pairs.
    pub fn make_cells<I, K, V>(&self, fields: I) -> Result<Vec<Cell>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<CellValue>,
    {
        fields
            .into_iter()
            .map(|(title, value)| self.make_cell(title.as_ref(), value))
            .collect()
    }
}

impl Tabular for Sheet {
    fn table(&self) -> &Table {
        &self.table
    }

    fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DuplicateKeyPolicy;
    use crate::error::RustySmartsheetError;
    use crate::index::{Filter, IndexError, IndexSpec};
    use crate::spreadsheet::row::RowSelector;
    use chrono::NaiveDate;
    use serde_json::json;

    fn payload() -> serde_json::Value {
        json!({
            "id": 4583173393803140i64,
            "name": "[TEST] Index Sheet",
            "accessLevel": "OWNER",
            "permalink": "https://app.example.com/sheets/abc",
            "version": 12,
            "totalRowCount": 3,
            "createdAt": "2019-01-10T11:12:13Z",
            "unknownField": {"ignored": true},
            "columns": [
                {"id": 11, "index": 0, "title": "Full Name", "type": "TEXT_NUMBER",
                 "primary": true},
                {"id": 12, "index": 1, "title": "Email address", "type": "TEXT_NUMBER"},
                {"id": 13, "index": 2, "title": "Company", "type": "TEXT_NUMBER"},
                {"id": 14, "index": 3, "title": "Birth date", "type": "DATE"},
                {"id": 15, "index": 4, "title": "Maintains", "type": "MULTI_PICKLIST",
                 "options": ["nornir", "napalm", "netmiko"]},
            ],
            "rows": [
                {"id": 501, "rowNumber": 1, "cells": [
                    {"columnId": 11, "value": "Alice Smith", "displayValue": "Alice Smith"},
                    {"columnId": 12, "value": "alice.smith@acme.com"},
                    {"columnId": 13, "value": "ACME"},
                    {"columnId": 14, "value": "1985-06-01"},
                ]},
                {"id": 502, "rowNumber": 2, "cells": [
                    {"columnId": 11, "value": "Bob Lee"},
                    {"columnId": 12, "value": "bob.lee@acme.com"},
                    {"columnId": 13, "value": "ACME"},
                    {"columnId": 15,
                     "objectValue": {"objectType": "MULTI_PICKLIST", "values": ["nornir"]}},
                ]},
                {"id": 503, "rowNumber": 3, "cells": [
                    {"columnId": 11, "value": "Charlie Brown"},
                    {"columnId": 12, "value": "charlie.brown@globex.com"},
                    {"columnId": 13, "value": "Globex"},
                ]},
            ],
        })
    }

    fn sheet() -> Sheet {
        Sheet::from_json(&payload().to_string()).unwrap()
    }

    fn full_name(row: &Row) -> &str {
        row.value("Full Name").unwrap().and_then(CellValue::as_str).unwrap()
    }

    #[test]
    fn decode_sheet() {
        let sheet = sheet();
        assert_eq!(sheet.name, "[TEST] Index Sheet");
        assert_eq!(sheet.total_row_count, Some(3));
        assert_eq!(
            sheet.permalink.as_ref().map(Url::as_str),
            Some("https://app.example.com/sheets/abc")
        );
        assert_eq!(sheet.columns().len(), 5);
        assert_eq!(sheet.rows().len(), 3);

        let alice = sheet.get_row(RowSelector::ById(501)).unwrap().unwrap();
        assert_eq!(
            alice.value("Birth date").unwrap().and_then(CellValue::as_date),
            NaiveDate::from_ymd_opt(1985, 6, 1)
        );
        let bob = sheet.get_row(RowSelector::ByPosition(2)).unwrap().unwrap();
        assert_eq!(
            bob.value("Maintains").unwrap(),
            Some(&CellValue::from(vec!["nornir"]))
        );
    }

    #[test]
    fn custom_indexes() {
        let mut sheet = sheet();
        sheet
            .build_index(vec![
                IndexSpec::non_unique(["Company"]),
                IndexSpec::unique(["Company", "Full Name"]),
                IndexSpec::unique(["Email address"]),
            ])
            .unwrap();
        assert_eq!(sheet.indexes().specs().len(), 3);

        let row = sheet
            .get_row(Filter::new().with("Email address", "charlie.brown@globex.com"))
            .unwrap()
            .unwrap();
        assert_eq!(full_name(row), "Charlie Brown");

        let row = sheet
            .get_row(Filter::new().with("Full Name", "Alice Smith").with("Company", "ACME"))
            .unwrap()
            .unwrap();
        assert_eq!(row.id, Some(501));

        let rows = sheet.get_rows(&Filter::new().with("Company", "ACME")).unwrap();
        let names: Vec<_> = rows.into_iter().map(full_name).collect();
        assert_eq!(names, ["Alice Smith", "Bob Lee"]);
    }

    #[test]
    fn duplicate_keys_follow_config() {
        let mut sheet = sheet();
        let result = sheet.build_index(vec![IndexSpec::unique(["Company"])]);
        assert!(matches!(
            result,
            Err(RustySmartsheetError::IndexError(IndexError::DuplicateKey { .. }))
        ));

        let config = Config::default().with_duplicate_keys(DuplicateKeyPolicy::Overwrite);
        let mut sheet = Sheet::from_json_with_config(&payload().to_string(), config).unwrap();
        sheet.build_index(vec![IndexSpec::unique(["Company"])]).unwrap();
        let row = sheet.get_row(Filter::new().with("Company", "ACME")).unwrap().unwrap();
        assert_eq!(row.id, Some(502));
    }

    #[test]
    fn as_list_rows() {
        let sheet = sheet();
        let list = sheet.as_list();
        assert_eq!(list.len(), 3);
        assert_eq!(list[2].len(), 3);
        assert_eq!(list[2]["Email address"], Some(CellValue::from("charlie.brown@globex.com")));
        assert!(!list[2].contains_key("Birth date"));
    }

    #[test]
    fn make_cells_by_title() {
        let sheet = sheet();
        let cells = sheet
            .make_cells([
                ("Full Name", CellValue::from("Dave Ward")),
                ("Birth date", CellValue::from(NaiveDate::from_ymd_opt(1980, 1, 1).unwrap())),
                ("Maintains", CellValue::from(vec!["napalm", "netmiko"])),
            ])
            .unwrap();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0], Cell::new(11, "Dave Ward"));
        assert_eq!(
            serde_json::to_value(&cells[1]).unwrap(),
            json!({"columnId": 14, "value": "1980-01-01"})
        );
        assert_eq!(cells[2], Cell::multi_picklist(15, ["napalm", "netmiko"]));

        let single = sheet.make_cell("Maintains", "nornir").unwrap();
        assert_eq!(single, Cell::multi_picklist(15, ["nornir"]));
    }

    #[test]
    fn make_cell_errors() {
        let sheet = sheet();
        assert!(matches!(
            sheet.make_cell("Nickname", "Al"),
            Err(RustySmartsheetError::SpreadsheetError(SpreadsheetError::ColumnNotFound { .. }))
        ));
        assert!(matches!(
            sheet.make_cell("Maintains", true),
            Err(RustySmartsheetError::SpreadsheetError(SpreadsheetError::InvalidCellValue { .. }))
        ));
    }

    #[test]
    fn invalid_payloads_carry_context() {
        let error = Sheet::from_json("{\"columns\": []}").unwrap_err();
        assert!(error.to_string().starts_with("Decode sheet failed: "));

        let mut payload = payload();
        payload["rows"][0]["cells"][3]["value"] = json!("first of June");
        let error = Sheet::from_json(&payload.to_string()).unwrap_err();
        let expected = "Load sheet '[TEST] Index Sheet' failed: Invalid cell value at 'Birth date'";
        assert!(error.to_string().starts_with(expected));
    }
}
