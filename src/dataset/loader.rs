//! Schema-driven TSV loader.
//!
//! [`TextLoader`] reads a tab-separated file into a [`DataView`] with one
//! text column per schema column. With a header row, file columns are
//! located by name, so column order in the file is free to differ from the
//! schema. Every failure names the offending path and line.
//!
//! # Examples
//!
//! ```no_run
//! use triage::dataset::loader::TextLoader;
//! use triage::dataset::schema::{ColumnKind, Schema};
//!
//! let mut schema = Schema::new();
//! schema.add_column("Title", ColumnKind::Text).unwrap();
//! schema.add_column("Description", ColumnKind::Text).unwrap();
//! schema.add_column("Area", ColumnKind::Text).unwrap();
//!
//! let loader = TextLoader::new(schema).with_header(true);
//! let view = loader.load("data/issues_train.tsv").unwrap();
//! println!("loaded {} rows", view.num_rows());
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::dataset::schema::{ColumnKind, Schema};
use crate::dataset::view::{ColumnData, DataView};
use crate::error::{Result, TriageError};

/// A loader that reads tab-separated text files into columnar views.
#[derive(Clone, Debug)]
pub struct TextLoader {
    schema: Schema,
    has_header: bool,
}

impl TextLoader {
    /// Create a new loader for the given schema.
    ///
    /// The delimiter is always a tab. By default the file is assumed to
    /// have no header row and schema columns map to file columns by
    /// position.
    pub fn new(schema: Schema) -> Self {
        TextLoader {
            schema,
            has_header: false,
        }
    }

    /// Set whether the first line is a header row.
    ///
    /// With a header, schema columns are located in the file by name and
    /// every schema column must appear in the header.
    pub fn with_header(mut self, has_header: bool) -> Self {
        self.has_header = has_header;
        self
    }

    /// Get the schema this loader reads through.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Load a file into a [`DataView`].
    ///
    /// The returned view has one `Text` column per schema column, in schema
    /// order. Missing files, header columns absent from the file, and rows
    /// too short for the referenced columns are all fatal errors naming the
    /// path (and line number where applicable).
    pub fn load<P: AsRef<Path>>(&self, path: P) -> Result<DataView> {
        let path = path.as_ref();
        self.schema.validate()?;

        for spec in self.schema.columns() {
            if spec.kind() != ColumnKind::Text {
                return Err(TriageError::schema(format!(
                    "loader can only read Text columns, '{}' is {:?}",
                    spec.name(),
                    spec.kind()
                )));
            }
        }

        let file = File::open(path).map_err(|e| {
            TriageError::dataset(format!(
                "cannot open dataset file '{}': {e}",
                path.display()
            ))
        })?;
        let reader = BufReader::new(file);
        let mut lines = reader.lines().enumerate();

        // Map each schema column to its position in the file.
        let positions: Vec<usize> = if self.has_header {
            let header = match lines.next() {
                Some((_, line)) => line.map_err(|e| {
                    TriageError::dataset(format!(
                        "cannot read header of '{}': {e}",
                        path.display()
                    ))
                })?,
                None => {
                    return Err(TriageError::dataset(format!(
                        "dataset file '{}' is empty",
                        path.display()
                    )));
                }
            };
            let header_fields: Vec<&str> = header.split('\t').collect();

            self.schema
                .columns()
                .iter()
                .map(|spec| {
                    header_fields
                        .iter()
                        .position(|f| *f == spec.name())
                        .ok_or_else(|| {
                            TriageError::dataset(format!(
                                "header of '{}' has no column '{}'",
                                path.display(),
                                spec.name()
                            ))
                        })
                })
                .collect::<Result<Vec<usize>>>()?
        } else {
            (0..self.schema.len()).collect()
        };

        let min_fields = positions.iter().copied().max().map_or(0, |m| m + 1);
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); self.schema.len()];
        let mut rows = 0usize;

        for (index, line) in lines {
            let line_number = index + 1;
            let line = line.map_err(|e| {
                TriageError::dataset(format!(
                    "cannot read '{}' line {line_number}: {e}",
                    path.display()
                ))
            })?;

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < min_fields {
                return Err(TriageError::dataset(format!(
                    "'{}' line {line_number}: expected at least {min_fields} fields, found {}",
                    path.display(),
                    fields.len()
                )));
            }

            for (column, &position) in columns.iter_mut().zip(positions.iter()) {
                column.push(fields[position].to_string());
            }
            rows += 1;
        }

        let mut view = DataView::new();
        for (spec, values) in self.schema.columns().iter().zip(columns) {
            view.add_column(spec.name(), ColumnData::Text(values))?;
        }

        debug!(
            rows,
            columns = view.num_columns(),
            path = %path.display(),
            "loaded dataset"
        );
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    fn issue_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_column("Title", ColumnKind::Text).unwrap();
        schema.add_column("Description", ColumnKind::Text).unwrap();
        schema.add_column("Area", ColumnKind::Text).unwrap();
        schema
    }

    fn write_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_with_header() {
        let file = write_file(
            "Title\tDescription\tArea\n\
             Crash on connect\tEF throws on open\tarea-System.Data\n\
             Socket timeout\tWebSocket drops\tarea-System.Net\n",
        );

        let loader = TextLoader::new(issue_schema()).with_header(true);
        let view = loader.load(file.path()).unwrap();

        // Header line is consumed, so rows = lines - 1.
        assert_eq!(view.num_rows(), 2);
        assert_eq!(
            view.text_column("Title").unwrap(),
            &["Crash on connect", "Socket timeout"]
        );
        assert_eq!(
            view.text_column("Area").unwrap(),
            &["area-System.Data", "area-System.Net"]
        );
    }

    #[test]
    fn test_load_header_order_differs_from_schema() {
        let file = write_file(
            "Area\tTitle\tDescription\n\
             area-System.Net\tSocket timeout\tWebSocket drops\n",
        );

        let loader = TextLoader::new(issue_schema()).with_header(true);
        let view = loader.load(file.path()).unwrap();

        assert_eq!(view.text_column("Title").unwrap(), &["Socket timeout"]);
        assert_eq!(view.text_column("Area").unwrap(), &["area-System.Net"]);
    }

    #[test]
    fn test_load_missing_file() {
        let loader = TextLoader::new(issue_schema()).with_header(true);
        let err = loader.load("no/such/file.tsv").unwrap_err();

        let message = err.to_string();
        assert!(message.contains("no/such/file.tsv"));
        assert!(message.contains("cannot open"));
    }

    #[test]
    fn test_load_short_row_names_line() {
        let file = write_file(
            "Title\tDescription\tArea\n\
             Good row\tfine\tarea-System.Data\n\
             short row only\n",
        );

        let loader = TextLoader::new(issue_schema()).with_header(true);
        let err = loader.load(file.path()).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("line 3"));
        assert!(message.contains("expected at least 3 fields"));
    }

    #[test]
    fn test_load_missing_header_column() {
        let file = write_file("Title\tDescription\nA\tB\n");

        let loader = TextLoader::new(issue_schema()).with_header(true);
        let err = loader.load(file.path()).unwrap_err();

        assert!(err.to_string().contains("no column 'Area'"));
    }

    #[test]
    fn test_load_without_header_maps_by_position() {
        let file = write_file("Crash\tEF fails\tarea-System.Data\n");

        let loader = TextLoader::new(issue_schema());
        let view = loader.load(file.path()).unwrap();

        assert_eq!(view.num_rows(), 1);
        assert_eq!(view.text_column("Title").unwrap(), &["Crash"]);
    }

    #[test]
    fn test_load_empty_file_with_header() {
        let file = write_file("");

        let loader = TextLoader::new(issue_schema()).with_header(true);
        let err = loader.load(file.path()).unwrap_err();

        assert!(err.to_string().contains("is empty"));
    }
}
