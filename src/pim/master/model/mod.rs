use std::fmt;

use serde::{Deserialize, Serialize};

/// A single cell. `None` marks an absent value; empty fields are loaded as
/// `None`, so an empty string never reaches the join logic.
pub type Cell = Option<String>;

/// Normalized join key derived from one or more source columns.
///
/// Keys exist purely for matching rows across tables. They are never written
/// to the master table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Wraps an already-normalized value. Callers are expected to go through
    /// [`crate::normalize`] instead; this exists for lookups and tests.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An ordered set of records sharing one column list.
///
/// Every row holds exactly `columns.len()` cells, so a row together with the
/// column list forms the ordered column → value mapping of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    /// Creates an empty table with the provided header.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from string literals, treating empty strings as absent.
    /// Mostly useful for fixtures.
    pub fn from_rows<C, R, V>(columns: C, rows: R) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        R: IntoIterator<Item = V>,
        V: IntoIterator,
        V::Item: AsRef<str>,
    {
        let mut table = Table::new(columns.into_iter().map(Into::into).collect());
        for row in rows {
            let cells = row
                .into_iter()
                .map(|value| {
                    let value = value.as_ref();
                    (!value.is_empty()).then(|| value.to_string())
                })
                .collect();
            table.push_row(cells);
        }
        table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of `name` in the header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Appends a row, padding short rows with absent cells and cutting long
    /// rows to the header width.
    pub fn push_row(&mut self, mut cells: Vec<Cell>) {
        cells.resize(self.columns.len(), None);
        self.rows.push(cells);
    }

    /// Value at (`row`, `column`); absent when the row, the column or the
    /// value itself is missing.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let index = self.column_index(column)?;
        self.cell(row, index)
    }

    /// Value at (`row`, column position).
    pub fn cell(&self, row: usize, index: usize) -> Option<&str> {
        self.rows.get(row)?.get(index)?.as_deref()
    }

    /// Iterates over one column. A column missing from the header yields an
    /// absent value for every row.
    pub fn column_values<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = Option<&'a str>> + use<'a> {
        let index = self.column_index(name);
        self.rows
            .iter()
            .map(move |row| index.and_then(|index| row[index].as_deref()))
    }

    /// Number of rows holding a value in `name`; zero when the column is missing.
    pub fn count_present(&self, name: &str) -> usize {
        self.column_values(name).filter(Option::is_some).count()
    }

    /// Appends a column, filling every existing row with `fill`. An existing
    /// column of the same name is left untouched.
    pub fn ensure_column(&mut self, name: &str, fill: Cell) -> usize {
        if let Some(index) = self.column_index(name) {
            return index;
        }
        self.columns.push(name.to_string());
        for row in &mut self.rows {
            row.push(fill.clone());
        }
        self.columns.len() - 1
    }

    /// Overwrites a single cell. Out-of-range positions are ignored.
    pub fn set_cell(&mut self, row: usize, index: usize, value: Cell) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|cells| cells.get_mut(index)) {
            *cell = value;
        }
    }

    /// Keeps only the rows whose position is listed, in the order given.
    pub fn select_rows(&self, positions: &[usize]) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: positions
                .iter()
                .filter_map(|position| self.rows.get(*position).cloned())
                .collect(),
        }
    }

    /// Keeps the columns whose position is listed, in the order given.
    pub fn select_columns(&self, indices: &[usize]) -> Table {
        Table {
            columns: indices.iter().map(|index| self.columns[*index].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| indices.iter().map(|index| row[*index].clone()).collect())
                .collect(),
        }
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<Vec<Cell>>) {
        (self.columns, self.rows)
    }

    pub(crate) fn from_parts(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let mut table = Table::new(columns);
        for row in rows {
            table.push_row(row);
        }
        table
    }
}
