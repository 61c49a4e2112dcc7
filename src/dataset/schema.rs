//! Schema management for tabular data structure definition.
//!
//! A [`Schema`] declares the named, typed columns of a [`DataView`]. The
//! loader uses it to map file columns by header name; the persisted model
//! embeds it so evaluation and inference read inputs through the exact
//! structure the model was trained on.
//!
//! [`DataView`]: crate::dataset::view::DataView
//!
//! # Examples
//!
//! ```
//! use triage::dataset::schema::{ColumnKind, Schema};
//!
//! let mut schema = Schema::new();
//! schema.add_column("Title", ColumnKind::Text).unwrap();
//! schema.add_column("Description", ColumnKind::Text).unwrap();
//!
//! assert_eq!(schema.len(), 2);
//! assert!(schema.has_column("Title"));
//! assert_eq!(schema.index_of("Description"), Some(1));
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// The kind of data a column holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnKind {
    /// Free text, one string per row.
    Text,
    /// Dense categorical key (u32) with a carried value vocabulary.
    Key,
    /// Fixed-dimension numeric vector per row.
    Vector,
}

/// Specification of a single named column.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    name: String,
    kind: ColumnKind,
}

impl ColumnSpec {
    /// Create a new column specification.
    pub fn new<S: Into<String>>(name: S, kind: ColumnKind) -> Self {
        ColumnSpec {
            name: name.into(),
            kind,
        }
    }

    /// Get the column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the column kind.
    pub fn kind(&self) -> ColumnKind {
        self.kind
    }
}

/// A schema defines the structure of a tabular view.
///
/// Columns are ordered; order is the order in which they were added.
/// Two schemas match structurally when they compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    /// Create a new empty schema.
    pub fn new() -> Self {
        Schema {
            columns: Vec::new(),
        }
    }

    /// Add a column to the schema.
    pub fn add_column<S: Into<String>>(&mut self, name: S, kind: ColumnKind) -> Result<()> {
        let name = name.into();

        if name.is_empty() {
            return Err(TriageError::schema("column name cannot be empty"));
        }

        if self.has_column(&name) {
            return Err(TriageError::schema(format!(
                "column '{name}' already exists"
            )));
        }

        self.columns.push(ColumnSpec::new(name, kind));
        Ok(())
    }

    /// Get a column specification by name.
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name() == name)
    }

    /// Check if a column exists.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name() == name)
    }

    /// Get the positional index of a column.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    /// Get all column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name()).collect()
    }

    /// Get all column specifications in declaration order.
    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if the schema is empty.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Validate that the schema is usable for loading.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(TriageError::schema("schema must have at least one column"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_add_and_lookup() {
        let mut schema = Schema::new();
        schema.add_column("Title", ColumnKind::Text).unwrap();
        schema.add_column("Area", ColumnKind::Text).unwrap();

        assert_eq!(schema.len(), 2);
        assert!(schema.has_column("Title"));
        assert!(!schema.has_column("Body"));
        assert_eq!(schema.index_of("Area"), Some(1));
        assert_eq!(schema.column("Title").unwrap().kind(), ColumnKind::Text);
        assert_eq!(schema.column_names(), vec!["Title", "Area"]);
    }

    #[test]
    fn test_schema_rejects_duplicates() {
        let mut schema = Schema::new();
        schema.add_column("Title", ColumnKind::Text).unwrap();

        let err = schema.add_column("Title", ColumnKind::Text).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    #[test]
    fn test_schema_rejects_empty_name() {
        let mut schema = Schema::new();
        assert!(schema.add_column("", ColumnKind::Text).is_err());
    }

    #[test]
    fn test_schema_structural_equality() {
        let mut a = Schema::new();
        a.add_column("Title", ColumnKind::Text).unwrap();
        let mut b = Schema::new();
        b.add_column("Title", ColumnKind::Text).unwrap();
        let mut c = Schema::new();
        c.add_column("Body", ColumnKind::Text).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_schema_validate() {
        assert!(Schema::new().validate().is_err());

        let mut schema = Schema::new();
        schema.add_column("Title", ColumnKind::Text).unwrap();
        assert!(schema.validate().is_ok());
    }
}
