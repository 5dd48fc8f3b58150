//! # Row Index Module
//!
//! Composite-key secondary indexes over a snapshot of rows. An index is built
//! from an [`IndexSpec`] (an ordered tuple of column titles plus a uniqueness
//! flag) and maps the tuple of cell values of each row to that row, or to
//! every matching row in row order for non-unique indexes.
//!
//! Indexes hold row positions, not rows: they stay valid only as long as the
//! row collection they were built from is left untouched. Any row change
//! requires a rebuild.
use crate::config::DuplicateKeyPolicy;
use crate::error::Result;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::column::ColumnLookup;
use crate::spreadsheet::SpreadsheetError;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors related to building and querying indexes.
#[derive(Error, Debug)]
pub enum IndexError {
    /// No index of the requested kind covers the filter's columns
    #[error("Index {columns:?} (unique: {unique}) is not found, build it first with build_index")]
    IndexNotFound { columns: Vec<String>, unique: bool },

    /// Two rows share a key in a unique index
    #[error("Duplicate key {key} in unique index {columns:?}")]
    DuplicateKey { columns: Vec<String>, key: String },

    /// An index specification without columns
    #[error("Index specification must name at least one column")]
    EmptyIndexSpec,
}

/// Something that can resolve a cell value by column title.
pub trait KeySource {
    /// Returns the value for the titled column, `None` when absent.
    /// Unknown titles are an error.
    fn key_value(&self, column_title: &str) -> Result<Option<&CellValue>>;
}

/// Describes one index: the ordered column titles forming the key and whether
/// a key maps to a single row.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexSpec {
    pub columns: Vec<String>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexSpec {
            columns: columns.into_iter().map(Into::into).collect(),
            unique: true,
        }
    }

    pub fn non_unique<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        IndexSpec {
            columns: columns.into_iter().map(Into::into).collect(),
            unique: false,
        }
    }

    fn column_set(&self) -> BTreeSet<&str> {
        self.columns.iter().map(String::as_str).collect()
    }
}

/// Composite key: one value per indexed column, in the index's column order.
/// `None` stands for a row without a value in that column.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexKey(pub Vec<Option<CellValue>>);

impl IndexKey {
    fn from_source<R: KeySource>(row: &R, columns: &[String]) -> Result<Self> {
        let mut parts = Vec::with_capacity(columns.len());
        for title in columns {
            parts.push(row.key_value(title)?.cloned());
        }
        Ok(IndexKey(parts))
    }

    fn from_filter(filter: &Filter, columns: &[String]) -> Self {
        IndexKey(
            columns
                .iter()
                .map(|title| filter.get(title).cloned().flatten())
                .collect(),
        )
    }
}

impl Display for IndexKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (position, part) in self.0.iter().enumerate() {
            if position > 0 {
                write!(f, ", ")?;
            }
            match part {
                Some(value) => write!(f, "{:?}", value.to_string())?,
                None => write!(f, "<empty>")?,
            }
        }
        write!(f, ")")
    }
}

/// Exact-match query: column title to expected value. Key order is irrelevant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: BTreeMap<String, Option<CellValue>>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the titled column to hold `value`.
    pub fn with(mut self, column_title: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.conditions.insert(column_title.into(), Some(value.into()));
        self
    }

    /// Requires the titled column to be empty on the row.
    pub fn with_empty(mut self, column_title: impl Into<String>) -> Self {
        self.conditions.insert(column_title.into(), None);
        self
    }

    pub fn get(&self, column_title: &str) -> Option<&Option<CellValue>> {
        self.conditions.get(column_title)
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.conditions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Option<CellValue>)> {
        self.conditions.iter()
    }

    fn column_set(&self) -> BTreeSet<&str> {
        self.columns().collect()
    }

    fn covers(&self, spec: &IndexSpec) -> bool {
        self.column_set() == spec.column_set()
    }
}

impl<K, V> FromIterator<(K, V)> for Filter
where
    K: Into<String>,
    V: Into<CellValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Filter::new(), |filter, (title, value)| filter.with(title, value))
    }
}

/// Index contents, by kind.
#[derive(Clone, Debug)]
pub enum IndexEntries {
    Unique(HashMap<IndexKey, usize>),
    NonUnique(HashMap<IndexKey, Vec<usize>>),
}

/// A built index: its specification and the key to row position mapping.
#[derive(Clone, Debug)]
pub struct Index {
    spec: IndexSpec,
    entries: IndexEntries,
}

impl Index {
    fn build<R: KeySource>(
        spec: &IndexSpec,
        rows: &[R],
        policy: DuplicateKeyPolicy,
    ) -> Result<Self> {
        let entries = if spec.unique {
            let mut entries: HashMap<IndexKey, usize> = HashMap::with_capacity(rows.len());
            for (position, row) in rows.iter().enumerate() {
                let key = IndexKey::from_source(row, &spec.columns)?;
                if entries.contains_key(&key) {
                    match policy {
                        DuplicateKeyPolicy::Reject => Err(IndexError::DuplicateKey {
                            columns: spec.columns.clone(),
                            key: key.to_string(),
                        })?,
                        DuplicateKeyPolicy::Overwrite => {
                            warn!(
                                columns = ?spec.columns,
                                %key,
                                position,
                                "overwriting duplicate key in unique index"
                            );
                        }
                    }
                }
                entries.insert(key, position);
            }
            IndexEntries::Unique(entries)
        } else {
            let mut entries: HashMap<IndexKey, Vec<usize>> = HashMap::new();
            for (position, row) in rows.iter().enumerate() {
                let key = IndexKey::from_source(row, &spec.columns)?;
                entries.entry(key).or_default().push(position);
            }
            IndexEntries::NonUnique(entries)
        };
        Ok(Index {
            spec: spec.clone(),
            entries,
        })
    }

    pub fn spec(&self) -> &IndexSpec {
        &self.spec
    }

    pub fn columns(&self) -> &[String] {
        &self.spec.columns
    }

    pub fn is_unique(&self) -> bool {
        self.spec.unique
    }

    pub fn entries(&self) -> &IndexEntries {
        &self.entries
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        match &self.entries {
            IndexEntries::Unique(entries) => entries.len(),
            IndexEntries::NonUnique(entries) => entries.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row positions stored under the key, in row order.
    pub fn positions(&self, key: &IndexKey) -> &[usize] {
        match &self.entries {
            IndexEntries::Unique(entries) => entries
                .get(key)
                .map(std::slice::from_ref)
                .unwrap_or_default(),
            IndexEntries::NonUnique(entries) => entries
                .get(key)
                .map(Vec::as_slice)
                .unwrap_or_default(),
        }
    }
}

/// The set of indexes of one sheet or report.
///
/// Specifications are remembered in build order so that a rebuild recreates
/// every index; building a specification whose column tuple is already
/// registered replaces the earlier one.
#[derive(Clone, Debug, Default)]
pub struct RowIndexes {
    specs: Vec<IndexSpec>,
    indexes: HashMap<Vec<String>, Index>,
}

impl RowIndexes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `specs` and rebuilds every registered index over `rows`.
    ///
    /// Nothing changes unless all indexes build: an unknown column title or a
    /// rejected duplicate key leaves the previous indexes in place.
    pub fn build<R, I>(
        &mut self,
        columns: &ColumnLookup,
        rows: &[R],
        specs: I,
        policy: DuplicateKeyPolicy,
    ) -> Result<()>
    where
        R: KeySource,
        I: IntoIterator<Item = IndexSpec>,
    {
        let mut registered = self.specs.clone();
        for spec in specs {
            if spec.columns.is_empty() {
                return Err(IndexError::EmptyIndexSpec.into());
            }
            match registered.iter_mut().find(|known| known.columns == spec.columns) {
                Some(known) => *known = spec,
                None => registered.push(spec),
            }
        }

        for spec in &registered {
            if let Some(title) = spec.columns.iter().find(|title| !columns.contains_title(title)) {
                return Err(SpreadsheetError::ColumnNotFound {
                    title: title.clone(),
                }
                .into());
            }
        }

        let mut indexes = HashMap::with_capacity(registered.len());
        for spec in &registered {
            let index = Index::build(spec, rows, policy)?;
            debug!(
                columns = ?spec.columns,
                unique = spec.unique,
                keys = index.len(),
                "built index"
            );
            indexes.insert(spec.columns.clone(), index);
        }

        info!(indexes = indexes.len(), rows = rows.len(), "rebuilt row indexes");
        self.specs = registered;
        self.indexes = indexes;
        Ok(())
    }

    /// Rebuilds every registered index, e.g. after rows changed.
    pub fn rebuild<R: KeySource>(
        &mut self,
        columns: &ColumnLookup,
        rows: &[R],
        policy: DuplicateKeyPolicy,
    ) -> Result<()> {
        self.build(columns, rows, Vec::new(), policy)
    }

    /// Drops every index and registered specification.
    pub fn clear(&mut self) {
        self.specs.clear();
        self.indexes.clear();
    }

    pub fn specs(&self) -> &[IndexSpec] {
        &self.specs
    }

    /// Built indexes in build order.
    pub fn iter(&self) -> impl Iterator<Item = &Index> {
        self.specs
            .iter()
            .filter_map(|spec| self.indexes.get(&spec.columns))
    }

    pub fn get<S: AsRef<str>>(&self, columns: &[S]) -> Option<&Index> {
        let columns: Vec<String> = columns.iter().map(|title| title.as_ref().to_owned()).collect();
        self.indexes.get(&columns)
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    fn resolve<S: AsRef<str>>(
        &self,
        columns: &[S],
        filter: &Filter,
        unique: bool,
    ) -> Result<&Index> {
        self.get(columns)
            .filter(|index| index.is_unique() == unique && filter.covers(index.spec()))
            .ok_or_else(|| {
                IndexError::IndexNotFound {
                    columns: columns.iter().map(|title| title.as_ref().to_owned()).collect(),
                    unique,
                }
                .into()
            })
    }

    fn find(&self, filter: &Filter, unique: bool) -> Result<&Index> {
        self.iter()
            .find(|index| index.is_unique() == unique && filter.covers(index.spec()))
            .ok_or_else(|| {
                IndexError::IndexNotFound {
                    columns: filter.columns().map(str::to_owned).collect(),
                    unique,
                }
                .into()
            })
    }

    /// Queries the unique index on exactly `columns`. The filter must name the
    /// same columns, in any order.
    pub fn lookup_one<S: AsRef<str>>(
        &self,
        columns: &[S],
        filter: &Filter,
    ) -> Result<Option<usize>> {
        let index = self.resolve(columns, filter, true)?;
        let key = IndexKey::from_filter(filter, index.columns());
        Ok(index.positions(&key).first().copied())
    }

    /// Queries the non-unique index on exactly `columns`. The filter must name
    /// the same columns, in any order.
    pub fn lookup_many<S: AsRef<str>>(&self, columns: &[S], filter: &Filter) -> Result<&[usize]> {
        let index = self.resolve(columns, filter, false)?;
        let key = IndexKey::from_filter(filter, index.columns());
        Ok(index.positions(&key))
    }

    /// Like [`RowIndexes::lookup_one`], using the first unique index built on
    /// the filter's columns.
    pub fn find_one(&self, filter: &Filter) -> Result<Option<usize>> {
        let index = self.find(filter, true)?;
        let key = IndexKey::from_filter(filter, index.columns());
        Ok(index.positions(&key).first().copied())
    }

    /// Like [`RowIndexes::lookup_many`], using the first non-unique index built
    /// on the filter's columns.
    pub fn find_many(&self, filter: &Filter) -> Result<&[usize]> {
        let index = self.find(filter, false)?;
        let key = IndexKey::from_filter(filter, index.columns());
        Ok(index.positions(&key))
    }
}
