use crate::config::Config;
use crate::error::{Result, ResultMessage};
use crate::spreadsheet::column::Column;
use crate::spreadsheet::row::Row;
use crate::spreadsheet::table::{Table, Tabular};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

/// Summary of a sheet feeding a report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSheet {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<Url>,
}

/// Report payload as decoded from the API. Report columns and cells are
/// addressed by virtual ids.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<Url>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_row_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub source_sheets: Vec<SourceSheet>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Represents a report: rows gathered from one or more source sheets.
#[derive(Clone, Debug)]
pub struct Report {
    pub id: Option<i64>,
    pub name: String,
    pub access_level: Option<String>,
    pub permalink: Option<Url>,
    pub total_row_count: Option<u32>,
    pub version: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub source_sheets: Vec<SourceSheet>,
    table: Table,
}

impl Report {
    pub fn new(data: ReportData) -> Result<Self> {
        Self::with_config(data, Config::default())
    }

    pub fn with_config(data: ReportData, config: Config) -> Result<Self> {
        let table = Table::new(data.columns, data.rows, config)?;
        Ok(Report {
            id: data.id,
            name: data.name,
            access_level: data.access_level,
            permalink: data.permalink,
            total_row_count: data.total_row_count,
            version: data.version,
            created_at: data.created_at,
            modified_at: data.modified_at,
            source_sheets: data.source_sheets,
            table,
        })
    }

    /// Decodes a report from the JSON body of a report response.
    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_json_with_config(json, Config::default())
    }

    pub fn from_json_with_config(json: &str, config: Config) -> Result<Self> {
        let data: Result<ReportData> = serde_json::from_str(json).map_err(Into::into);
        let data = data.with_prefix("Decode report failed")?;
        let name = data.name.clone();
        Self::with_config(data, config).with_prefix(&format!("Load report '{}' failed", name))
    }

    /// Returns the source sheet a row was gathered from.
    pub fn source_sheet(&self, row: &Row) -> Option<&SourceSheet> {
        let sheet_id = row.sheet_id?;
        self.source_sheets
            .iter()
            .find(|sheet| sheet.id == Some(sheet_id))
    }
}

impl Tabular for Report {
    fn table(&self) -> &Table {
        &self.table
    }

    fn table_mut(&mut self) -> &mut Table {
        &mut self.table
    }
}
