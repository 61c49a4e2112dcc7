//! Columnar in-memory data view.
//!
//! A [`DataView`] is the tabular container that flows through the feature
//! pipeline: the loader produces one with text columns, each fitted stage
//! appends derived columns (keys, feature vectors, scores), and consumers
//! read columns back by name. All columns of a view have the same row count.
//!
//! Key columns carry their value vocabulary with the data, so decoding a
//! key back to its original string never needs separate fitted state.

use crate::dataset::schema::ColumnKind;
use crate::error::{Result, TriageError};

/// Sentinel key for a categorical value outside the frozen vocabulary.
///
/// Rows whose label was never seen at fit time encode to this value; it is
/// never produced as a prediction, so such rows can never count as correct.
pub const MISSING_KEY: u32 = u32::MAX;

/// Typed storage for one column.
#[derive(Clone, Debug, PartialEq)]
pub enum ColumnData {
    /// Free text, one string per row.
    Text(Vec<String>),
    /// Dense categorical keys plus the vocabulary they index into.
    Key { values: Vec<u32>, vocab: Vec<String> },
    /// Fixed-dimension vectors, one per row.
    Vector { dim: usize, rows: Vec<Vec<f32>> },
}

impl ColumnData {
    /// Number of rows in this column.
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Text(values) => values.len(),
            ColumnData::Key { values, .. } => values.len(),
            ColumnData::Vector { rows, .. } => rows.len(),
        }
    }

    /// Check if this column has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The kind tag for this column's storage.
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Text(_) => ColumnKind::Text,
            ColumnData::Key { .. } => ColumnKind::Key,
            ColumnData::Vector { .. } => ColumnKind::Vector,
        }
    }
}

/// A named column inside a view.
#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    name: String,
    data: ColumnData,
}

impl Column {
    /// Create a new named column.
    pub fn new<S: Into<String>>(name: S, data: ColumnData) -> Self {
        Column {
            name: name.into(),
            data,
        }
    }

    /// Get the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the column data.
    pub fn data(&self) -> &ColumnData {
        &self.data
    }
}

/// A schema-typed, fully materialized columnar table.
///
/// Views start empty; the first added column fixes the row count and every
/// later column must match it. Pipeline stages append new columns; only
/// the key-decode stage replaces one, and only with equal row count.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataView {
    columns: Vec<Column>,
}

impl DataView {
    /// Create a new empty view.
    pub fn new() -> Self {
        DataView {
            columns: Vec::new(),
        }
    }

    /// Add a column to the view.
    ///
    /// Fails if the name is already taken or the row count differs from the
    /// view's existing columns.
    pub fn add_column<S: Into<String>>(&mut self, name: S, data: ColumnData) -> Result<()> {
        let name = name.into();

        if self.has_column(&name) {
            return Err(TriageError::schema(format!(
                "column '{name}' already exists in view"
            )));
        }

        if let Some(first) = self.columns.first() {
            if first.data().len() != data.len() {
                return Err(TriageError::schema(format!(
                    "column '{name}' has {} rows, view has {}",
                    data.len(),
                    first.data().len()
                )));
            }
        }

        self.columns.push(Column::new(name, data));
        Ok(())
    }

    /// Replace an existing column's data, keeping its name and position.
    ///
    /// Used by the key-decode stage, whose output column name equals its
    /// input. The replacement must have the view's row count.
    pub fn replace_column(&mut self, name: &str, data: ColumnData) -> Result<()> {
        let rows = self.num_rows();
        if data.len() != rows {
            return Err(TriageError::schema(format!(
                "replacement for '{name}' has {} rows, view has {rows}",
                data.len()
            )));
        }

        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(column) => {
                column.data = data;
                Ok(())
            }
            None => Err(TriageError::schema(format!("column '{name}' not found"))),
        }
    }

    /// Get a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name() == name)
    }

    /// Get all column names in insertion order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Number of rows (0 for a view with no columns).
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data().len())
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Get a text column's values, failing with a descriptive error if the
    /// column is absent or of another kind.
    pub fn text_column(&self, name: &str) -> Result<&[String]> {
        match self.column(name).map(Column::data) {
            Some(ColumnData::Text(values)) => Ok(values),
            Some(other) => Err(TriageError::schema(format!(
                "column '{name}' is {:?}, expected Text",
                other.kind()
            ))),
            None => Err(TriageError::schema(format!("column '{name}' not found"))),
        }
    }

    /// Get a key column's values and vocabulary.
    pub fn key_column(&self, name: &str) -> Result<(&[u32], &[String])> {
        match self.column(name).map(Column::data) {
            Some(ColumnData::Key { values, vocab }) => Ok((values, vocab)),
            Some(other) => Err(TriageError::schema(format!(
                "column '{name}' is {:?}, expected Key",
                other.kind()
            ))),
            None => Err(TriageError::schema(format!("column '{name}' not found"))),
        }
    }

    /// Get a vector column's dimension and rows.
    pub fn vector_column(&self, name: &str) -> Result<(usize, &[Vec<f32>])> {
        match self.column(name).map(Column::data) {
            Some(ColumnData::Vector { dim, rows }) => Ok((*dim, rows)),
            Some(other) => Err(TriageError::schema(format!(
                "column '{name}' is {:?}, expected Vector",
                other.kind()
            ))),
            None => Err(TriageError::schema(format!("column '{name}' not found"))),
        }
    }
}
