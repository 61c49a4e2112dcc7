//! Vector column concatenation stage.

use serde::{Deserialize, Serialize};

use crate::dataset::view::{ColumnData, DataView};
use crate::error::{Result, TriageError};
use crate::pipeline::Transform;

/// Specification: concatenate the `inputs` vector columns into a single
/// `output` vector column whose dimension is the sum of the inputs'.
///
/// Stateless; fitting only validates that every input exists and is a
/// vector column.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Concatenate {
    inputs: Vec<String>,
    output: String,
}

impl Concatenate {
    /// Create a new concatenation specification.
    pub fn new<S: Into<String>>(inputs: Vec<S>, output: S) -> Self {
        Concatenate {
            inputs: inputs.into_iter().map(Into::into).collect(),
            output: output.into(),
        }
    }

    /// Get the input column names.
    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    /// Get the output column name.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Fit: validate the input columns.
    pub fn fit(&self, view: &DataView) -> Result<Concatenate> {
        if self.inputs.is_empty() {
            return Err(TriageError::pipeline(
                "concatenate needs at least one input column",
            ));
        }
        for input in &self.inputs {
            view.vector_column(input)?;
        }
        Ok(self.clone())
    }
}

impl Transform for Concatenate {
    fn transform(&self, mut view: DataView) -> Result<DataView> {
        let mut total_dim = 0;
        let mut parts = Vec::with_capacity(self.inputs.len());
        for input in &self.inputs {
            let (dim, rows) = view.vector_column(input)?;
            total_dim += dim;
            parts.push(rows);
        }

        let n_rows = view.num_rows();
        let mut rows = Vec::with_capacity(n_rows);
        for i in 0..n_rows {
            let mut row = Vec::with_capacity(total_dim);
            for part in &parts {
                row.extend_from_slice(&part[i]);
            }
            rows.push(row);
        }

        view.add_column(
            &self.output,
            ColumnData::Vector {
                dim: total_dim,
                rows,
            },
        )?;
        Ok(view)
    }

    fn name(&self) -> &'static str {
        "concatenate"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(dim: usize, rows: Vec<Vec<f32>>) -> ColumnData {
        ColumnData::Vector { dim, rows }
    }

    #[test]
    fn test_concatenate_sums_dimensions() {
        let mut view = DataView::new();
        view.add_column("A", vector(2, vec![vec![1.0, 2.0], vec![3.0, 4.0]]))
            .unwrap();
        view.add_column("B", vector(1, vec![vec![5.0], vec![6.0]]))
            .unwrap();

        let spec = Concatenate::new(vec!["A", "B"], "Features");
        let fitted = spec.fit(&view).unwrap();
        let out = fitted.transform(view).unwrap();

        let (dim, rows) = out.vector_column("Features").unwrap();
        assert_eq!(dim, 3);
        assert_eq!(rows[0], vec![1.0, 2.0, 5.0]);
        assert_eq!(rows[1], vec![3.0, 4.0, 6.0]);
    }

    #[test]
    fn test_concatenate_preserves_input_order() {
        let mut view = DataView::new();
        view.add_column("B", vector(1, vec![vec![9.0]])).unwrap();
        view.add_column("A", vector(1, vec![vec![1.0]])).unwrap();

        let out = Concatenate::new(vec!["A", "B"], "Features")
            .transform(view)
            .unwrap();

        // Order follows the spec's input list, not view column order.
        assert_eq!(out.vector_column("Features").unwrap().1[0], vec![1.0, 9.0]);
    }

    #[test]
    fn test_fit_rejects_missing_or_non_vector_inputs() {
        let mut view = DataView::new();
        view.add_column("Text", ColumnData::Text(vec!["a".to_string()]))
            .unwrap();

        assert!(
            Concatenate::new(vec!["Missing"], "Features")
                .fit(&view)
                .is_err()
        );
        assert!(
            Concatenate::new(vec!["Text"], "Features")
                .fit(&view)
                .is_err()
        );
        assert!(
            Concatenate::new(Vec::<String>::new(), "Features".to_string())
                .fit(&view)
                .is_err()
        );
    }
}
