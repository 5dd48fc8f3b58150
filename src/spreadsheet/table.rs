use crate::config::Config;
use crate::error::Result;
use crate::index::{Filter, IndexSpec, RowIndexes};
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::column::{Column, ColumnLookup, ColumnSelector};
use crate::spreadsheet::row::{Row, RowSelector};
use crate::spreadsheet::SpreadsheetError;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::debug;

/// The row collection behind a sheet or report: columns, rows, direct row
/// lookups and the secondary indexes built over the rows.
#[derive(Clone, Debug)]
pub struct Table {
    /// Column lookup shared with every attached row
    columns: Arc<ColumnLookup>,
    rows: Vec<Row>,
    row_by_id: HashMap<i64, usize>,
    row_by_num: HashMap<u32, usize>,
    indexes: RowIndexes,
    config: Config,
}

impl Table {
    /// Creates a table, attaching every row to the columns.
    pub(crate) fn new(columns: Vec<Column>, rows: Vec<Row>, config: Config) -> Result<Self> {
        let mut table = Table {
            columns: Arc::new(ColumnLookup::new(columns)),
            rows: Vec::new(),
            row_by_id: HashMap::new(),
            row_by_num: HashMap::new(),
            indexes: RowIndexes::new(),
            config,
        };
        table.set_rows(rows)?;
        Ok(table)
    }

    /// Replaces all rows, e.g. after a fresh fetch. Registered indexes are
    /// rebuilt over the new rows.
    ///
    /// On failure the table keeps its previous rows and indexes.
    pub fn set_rows(&mut self, mut rows: Vec<Row>) -> Result<()> {
        for row in rows.iter_mut() {
            row.attach(self.columns.clone(), &self.config)?;
        }
        debug!(
            columns = self.columns.columns().len(),
            rows = rows.len(),
            "attached rows to columns"
        );

        let mut indexes = RowIndexes::new();
        if !self.indexes.specs().is_empty() {
            indexes.build(
                &self.columns,
                &rows,
                self.indexes.specs().to_vec(),
                self.config.duplicate_keys,
            )?;
        }

        self.rows = rows;
        self.indexes = indexes;
        self.update_row_lookup();
        Ok(())
    }

    fn update_row_lookup(&mut self) {
        self.row_by_id.clear();
        self.row_by_num.clear();
        for (position, row) in self.rows.iter().enumerate() {
            if let Some(id) = row.id {
                self.row_by_id.insert(id, position);
            }
            if let Some(num) = row.num {
                self.row_by_num.insert(num, position);
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn columns(&self) -> &[Column] {
        self.columns.columns()
    }

    pub(crate) fn column_lookup(&self) -> &ColumnLookup {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn indexes(&self) -> &RowIndexes {
        &self.indexes
    }

    /// Returns a column by title or id.
    pub fn get_column(&self, selector: impl Into<ColumnSelector>) -> Result<&Column> {
        self.columns.get(&selector.into())
    }

    /// Registers index specifications and rebuilds all indexes.
    pub fn build_index<I>(&mut self, specs: I) -> Result<()>
    where
        I: IntoIterator<Item = IndexSpec>,
    {
        self.indexes
            .build(&self.columns, &self.rows, specs, self.config.duplicate_keys)
    }

    /// Rebuilds all registered indexes over the current rows.
    pub fn rebuild_indexes(&mut self) -> Result<()> {
        self.indexes
            .rebuild(&self.columns, &self.rows, self.config.duplicate_keys)
    }

    /// Validates filter titles before any index is consulted.
    fn check_filter(&self, filter: &Filter) -> Result<()> {
        if filter.is_empty() {
            Err(SpreadsheetError::AmbiguousLookup {
                message: "filter should name at least one column".to_owned(),
            })?
        }
        match filter.columns().find(|title| !self.columns.contains_title(title)) {
            Some(title) => Err(SpreadsheetError::ColumnNotFound {
                title: title.to_owned(),
            })?,
            None => Ok(()),
        }
    }

    /// Returns a single row by id, by row number or through a unique index
    /// covering the filter's columns. `None` means no such row.
    pub fn get_row(&self, selector: impl Into<RowSelector>) -> Result<Option<&Row>> {
        match selector.into() {
            RowSelector::ById(id) => {
                Ok(self.row_by_id.get(&id).map(|position| &self.rows[*position]))
            }
            RowSelector::ByPosition(num) => {
                Ok(self.row_by_num.get(&num).map(|position| &self.rows[*position]))
            }
            RowSelector::ByFilter(filter) => {
                self.check_filter(&filter)?;
                let position = self.indexes.find_one(&filter)?;
                Ok(position.map(|position| &self.rows[position]))
            }
        }
    }

    /// Returns every row matching the filter through a non-unique index
    /// covering its columns, in row order.
    pub fn get_rows(&self, filter: &Filter) -> Result<Vec<&Row>> {
        self.check_filter(filter)?;
        let positions = self.indexes.find_many(filter)?;
        Ok(positions.iter().map(|position| &self.rows[*position]).collect())
    }

    /// Queries the unique index built on exactly `columns`.
    pub fn lookup_row<S: AsRef<str>>(
        &self,
        columns: &[S],
        filter: &Filter,
    ) -> Result<Option<&Row>> {
        self.check_filter(filter)?;
        let position = self.indexes.lookup_one(columns, filter)?;
        Ok(position.map(|position| &self.rows[position]))
    }

    /// Queries the non-unique index built on exactly `columns`.
    pub fn lookup_rows<S: AsRef<str>>(&self, columns: &[S], filter: &Filter) -> Result<Vec<&Row>> {
        self.check_filter(filter)?;
        let positions = self.indexes.lookup_many(columns, filter)?;
        Ok(positions.iter().map(|position| &self.rows[*position]).collect())
    }

    /// Returns every row as a map of column title to cell value.
    pub fn as_list(&self) -> Vec<BTreeMap<String, Option<CellValue>>> {
        self.rows.iter().map(Row::as_map).collect()
    }
}

/// Access to the table of a sheet-like object, with the table operations
/// available directly on it.
pub trait Tabular {
    fn table(&self) -> &Table;

    fn table_mut(&mut self) -> &mut Table;

    fn columns(&self) -> &[Column] {
        self.table().columns()
    }

    fn rows(&self) -> &[Row] {
        self.table().rows()
    }

    fn indexes(&self) -> &RowIndexes {
        self.table().indexes()
    }

    fn get_column(&self, selector: impl Into<ColumnSelector>) -> Result<&Column> {
        self.table().get_column(selector)
    }

    fn get_row(&self, selector: impl Into<RowSelector>) -> Result<Option<&Row>> {
        self.table().get_row(selector)
    }

    fn get_rows(&self, filter: &Filter) -> Result<Vec<&Row>> {
        self.table().get_rows(filter)
    }

    fn build_index<I>(&mut self, specs: I) -> Result<()>
    where
        I: IntoIterator<Item = IndexSpec>,
    {
        self.table_mut().build_index(specs)
    }

    fn rebuild_indexes(&mut self) -> Result<()> {
        self.table_mut().rebuild_indexes()
    }

    fn as_list(&self) -> Vec<BTreeMap<String, Option<CellValue>>> {
        self.table().as_list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RustySmartsheetError;
    use crate::index::IndexError;
    use crate::spreadsheet::cell::Cell;
    use crate::spreadsheet::column::ColumnType;

    fn table() -> Table {
        let columns = vec![
            Column::new(1, "Company", ColumnType::TextNumber),
            Column::new(2, "Name", ColumnType::TextNumber),
        ];
        let rows = [("ACME", "Alice"), ("ACME", "Bob"), ("Globex", "Charlie")]
            .iter()
            .enumerate()
            .map(|(position, (company, name))| {
                let mut row = Row::new(vec![Cell::new(1, *company), Cell::new(2, *name)]);
                row.id = Some(100 + position as i64);
                row.num = Some(position as u32 + 1);
                row
            })
            .collect();
        Table::new(columns, rows, Config::default()).unwrap()
    }

    fn name(row: Option<&Row>) -> Option<String> {
        row.and_then(|row| {
            row.value("Name")
                .unwrap()
                .and_then(CellValue::as_str)
                .map(str::to_owned)
        })
    }

    #[test]
    fn direct_lookup() {
        let table = table();
        assert_eq!(name(table.get_row(RowSelector::ById(101)).unwrap()), Some("Bob".to_owned()));
        assert_eq!(
            name(table.get_row(RowSelector::ByPosition(3)).unwrap()),
            Some("Charlie".to_owned())
        );
        assert!(table.get_row(RowSelector::ById(7)).unwrap().is_none());
        assert!(table.get_row(RowSelector::ByPosition(9)).unwrap().is_none());
    }

    #[test]
    fn indexed_lookup() {
        let mut table = table();
        table
            .build_index(vec![
                IndexSpec::unique(["Company", "Name"]),
                IndexSpec::non_unique(["Company"]),
            ])
            .unwrap();

        let filter = Filter::new().with("Name", "Bob").with("Company", "ACME");
        assert_eq!(name(table.get_row(filter.clone()).unwrap()), Some("Bob".to_owned()));
        assert_eq!(
            name(table.lookup_row(&["Company", "Name"], &filter).unwrap()),
            Some("Bob".to_owned())
        );

        let rows = table.get_rows(&Filter::new().with("Company", "ACME")).unwrap();
        let names: Vec<_> = rows.into_iter().map(|row| name(Some(row)).unwrap()).collect();
        assert_eq!(names, ["Alice", "Bob"]);

        let rows = table
            .lookup_rows(&["Company"], &Filter::new().with("Company", "Initech"))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn filter_validation() {
        let mut table = table();
        table.build_index(vec![IndexSpec::unique(["Name"])]).unwrap();

        assert!(matches!(
            table.get_row(Filter::new()),
            Err(RustySmartsheetError::SpreadsheetError(SpreadsheetError::AmbiguousLookup { .. }))
        ));
        assert!(matches!(
            table.get_rows(&Filter::new().with("Email", "a@b.c")),
            Err(RustySmartsheetError::SpreadsheetError(SpreadsheetError::ColumnNotFound { .. }))
        ));
        assert!(matches!(
            table.get_rows(&Filter::new().with("Company", "ACME")),
            Err(RustySmartsheetError::IndexError(IndexError::IndexNotFound { .. }))
        ));
    }

    #[test]
    fn replacing_rows_rebuilds_indexes() {
        let mut table = table();
        table.build_index(vec![IndexSpec::non_unique(["Company"])]).unwrap();

        let mut row = Row::new(vec![Cell::new(1, "ACME"), Cell::new(2, "Dave")]);
        row.id = Some(200);
        row.num = Some(1);
        table.set_rows(vec![row]).unwrap();

        let rows = table.get_rows(&Filter::new().with("Company", "ACME")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, Some(200));
        assert!(table.get_row(RowSelector::ById(100)).unwrap().is_none());
    }

    #[test]
    fn failed_row_replacement_keeps_previous_state() {
        let mut table = table();
        table.build_index(vec![IndexSpec::unique(["Name"])]).unwrap();

        let duplicates = (0..2)
            .map(|position| {
                let mut row = Row::new(vec![Cell::new(1, "Initech"), Cell::new(2, "Dup")]);
                row.id = Some(300 + position);
                row.num = Some(position as u32 + 1);
                row
            })
            .collect();
        assert!(matches!(
            table.set_rows(duplicates),
            Err(RustySmartsheetError::IndexError(IndexError::DuplicateKey { .. }))
        ));

        assert_eq!(table.rows().len(), 3);
        assert_eq!(table.indexes().specs().len(), 1);
        let bob = Filter::new().with("Name", "Bob");
        assert_eq!(name(table.get_row(bob).unwrap()), Some("Bob".to_owned()));
        let charlie = Filter::new().with("Name", "Charlie");
        assert_eq!(name(table.get_row(charlie).unwrap()), Some("Charlie".to_owned()));
        assert_eq!(name(table.get_row(RowSelector::ById(100)).unwrap()), Some("Alice".to_owned()));
        assert!(table.get_row(RowSelector::ById(300)).unwrap().is_none());
    }

    #[test]
    fn columns_and_list() {
        let table = table();
        assert_eq!(table.get_column("Name").unwrap().id, Some(2));
        assert_eq!(table.get_column(1i64).unwrap().title.as_deref(), Some("Company"));
        assert!(table.get_column("Email").is_err());

        let list = table.as_list();
        assert_eq!(list.len(), 3);
        assert_eq!(list[2]["Company"], Some(CellValue::from("Globex")));
    }
}
