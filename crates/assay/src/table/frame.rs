//! Column-oriented table with a stable row index.

use std::collections::HashSet;
use std::ops::Deref;

use indexmap::IndexMap;

use crate::error::{AssayError, Result};

use super::value::Value;

/// In-memory table: ordered named columns plus one index label per row.
///
/// Every column always holds exactly one cell per index label. Index labels
/// are unique; operators that only drop rows keep the surviving labels,
/// operators that regroup rows renumber them from zero.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: IndexMap<String, Vec<Value>>,
    index: Vec<usize>,
}

impl Table {
    /// Create a table with no columns and no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table from `(name, cells)` pairs, indexed `0..n`.
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        let mut table = Table::new();
        let mut first = true;
        for (name, cells) in columns {
            let name = name.into();
            if first {
                table.index = (0..cells.len()).collect();
                first = false;
            }
            if table.columns.contains_key(&name) {
                return Err(AssayError::Config(format!(
                    "Duplicate column '{}' in table definition",
                    name
                )));
            }
            table.insert_column(name, cells)?;
        }
        Ok(table)
    }

    /// Replace the index labels.
    pub fn with_index(mut self, index: Vec<usize>) -> Result<Self> {
        if index.len() != self.index.len() {
            return Err(AssayError::Config(format!(
                "Index has {} labels but the table has {} rows",
                index.len(),
                self.index.len()
            )));
        }
        let unique: HashSet<_> = index.iter().collect();
        if unique.len() != index.len() {
            return Err(AssayError::Config("Index labels must be unique".to_string()));
        }
        self.index = index;
        Ok(self)
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    /// Get the number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// A table without rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Column names in display order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(|k| k.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns.get(name).map(|c| c.as_slice())
    }

    /// Get a column or fail with a missing-column error.
    pub fn require_column(&self, name: &str, context: &str) -> Result<&[Value]> {
        self.column(name)
            .ok_or_else(|| AssayError::missing_column(name, context))
    }

    /// Iterate `(name, cells)` in display order.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Row index labels.
    pub fn index(&self) -> &[usize] {
        &self.index
    }

    /// Get a specific cell by row position.
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        self.columns.get(column).and_then(|c| c.get(row))
    }

    /// Pair each cell of a column with its index label.
    pub fn labelled<'a>(
        &'a self,
        column: &str,
    ) -> Option<impl Iterator<Item = (usize, &'a Value)> + use<'a>> {
        let cells = self.columns.get(column)?;
        Some(self.index.iter().copied().zip(cells.iter()))
    }

    /// Add or replace a column. Replacing keeps the column's position.
    pub fn insert_column(&mut self, name: impl Into<String>, cells: Vec<Value>) -> Result<()> {
        let name = name.into();
        if self.columns.is_empty() && self.index.is_empty() {
            self.index = (0..cells.len()).collect();
        }
        if cells.len() != self.index.len() {
            return Err(AssayError::Config(format!(
                "Column '{}' has {} cells but the table has {} rows",
                name,
                cells.len(),
                self.index.len()
            )));
        }
        self.columns.insert(name, cells);
        Ok(())
    }

    /// Keep the rows at the given positions, in the given order, with their labels.
    pub fn take_rows(&self, positions: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|(name, cells)| {
                let picked = positions.iter().map(|&p| cells[p].clone()).collect();
                (name.clone(), picked)
            })
            .collect();
        let index = positions.iter().map(|&p| self.index[p]).collect();
        Table { columns, index }
    }

    /// Drop the rows carrying any of the given labels.
    pub fn drop_labels(&self, labels: &HashSet<usize>) -> Table {
        let keep: Vec<usize> = self
            .index
            .iter()
            .enumerate()
            .filter(|(_, label)| !labels.contains(label))
            .map(|(pos, _)| pos)
            .collect();
        self.take_rows(&keep)
    }

    /// Renumber the index `0..n`.
    pub fn reset_index(&mut self) {
        self.index = (0..self.index.len()).collect();
    }
}

/// A table guaranteed to hold at least one row.
///
/// Operators take this as their input type.
#[derive(Debug, Clone, PartialEq)]
pub struct NonEmptyTable(Table);

impl NonEmptyTable {
    pub fn new(table: Table) -> Result<Self> {
        if table.is_empty() {
            return Err(AssayError::EmptyTable(format!(
                "got a table with {} columns and no rows",
                table.column_count()
            )));
        }
        Ok(Self(table))
    }

    pub fn into_inner(self) -> Table {
        self.0
    }
}

impl TryFrom<Table> for NonEmptyTable {
    type Error = AssayError;

    fn try_from(table: Table) -> Result<Self> {
        Self::new(table)
    }
}

impl Deref for NonEmptyTable {
    type Target = Table;

    fn deref(&self) -> &Table {
        &self.0
    }
}
