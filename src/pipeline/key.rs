//! Categorical key encoding and decoding stages.
//!
//! [`MapValueToKey`] freezes the distinct values of a text column into a
//! first-seen-ordered vocabulary at fit time and encodes the column as
//! dense `u32` keys. The vocabulary travels on the produced key column, so
//! [`MapKeyToValue`] can decode any key column without fitted state of its
//! own. A value never seen at fit time encodes to [`MISSING_KEY`] and can
//! never be decoded or matched by a prediction.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::dataset::view::{ColumnData, DataView, MISSING_KEY};
use crate::error::{Result, TriageError};
use crate::pipeline::Transform;

/// Specification: encode text column `input` into key column `output`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapValueToKey {
    input: String,
    output: String,
}

impl MapValueToKey {
    /// Create a new key-encoding specification.
    pub fn new<S: Into<String>>(input: S, output: S) -> Self {
        MapValueToKey {
            input: input.into(),
            output: output.into(),
        }
    }

    /// Get the input column name.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Get the output column name.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Fit: collect the input column's distinct values in first-seen order.
    pub fn fit(&self, view: &DataView) -> Result<FittedMapValueToKey> {
        let values = view.text_column(&self.input)?;

        let mut vocab = Vec::new();
        let mut seen: AHashMap<&str, u32> = AHashMap::new();
        for value in values {
            if !seen.contains_key(value.as_str()) {
                seen.insert(value.as_str(), vocab.len() as u32);
                vocab.push(value.clone());
            }
        }

        if vocab.is_empty() {
            return Err(TriageError::pipeline(format!(
                "cannot key-encode '{}': column has no values",
                self.input
            )));
        }

        Ok(FittedMapValueToKey {
            input: self.input.clone(),
            output: self.output.clone(),
            vocab,
        })
    }
}

/// Fitted key encoder carrying the frozen vocabulary.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FittedMapValueToKey {
    input: String,
    output: String,
    vocab: Vec<String>,
}

impl FittedMapValueToKey {
    /// The frozen vocabulary, in key order.
    pub fn vocab(&self) -> &[String] {
        &self.vocab
    }
}

impl Transform for FittedMapValueToKey {
    fn transform(&self, mut view: DataView) -> Result<DataView> {
        let values = view.text_column(&self.input)?;

        let index: AHashMap<&str, u32> = self
            .vocab
            .iter()
            .enumerate()
            .map(|(i, v)| (v.as_str(), i as u32))
            .collect();

        let keys: Vec<u32> = values
            .iter()
            .map(|v| index.get(v.as_str()).copied().unwrap_or(MISSING_KEY))
            .collect();

        view.add_column(
            &self.output,
            ColumnData::Key {
                values: keys,
                vocab: self.vocab.clone(),
            },
        )?;
        Ok(view)
    }

    fn name(&self) -> &'static str {
        "map_value_to_key"
    }
}

/// Specification: decode key column `column` back to its original values.
///
/// Stateless; the vocabulary is read from the key column itself. The
/// decoded text replaces the key column under the same name, matching the
/// convention that the decode's output column is its input column.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MapKeyToValue {
    column: String,
}

impl MapKeyToValue {
    /// Create a new key-decoding specification.
    pub fn new<S: Into<String>>(column: S) -> Self {
        MapKeyToValue {
            column: column.into(),
        }
    }

    /// Get the target column name.
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Fit: validate that the target column exists and is a key column.
    pub fn fit(&self, view: &DataView) -> Result<MapKeyToValue> {
        view.key_column(&self.column)?;
        Ok(self.clone())
    }
}

impl Transform for MapKeyToValue {
    fn transform(&self, mut view: DataView) -> Result<DataView> {
        let (keys, vocab) = view.key_column(&self.column)?;

        let decoded: Vec<String> = keys
            .iter()
            .map(|&key| {
                vocab.get(key as usize).cloned().ok_or_else(|| {
                    TriageError::pipeline(format!(
                        "key {key} in column '{}' has no value in its vocabulary of {}",
                        self.column,
                        vocab.len()
                    ))
                })
            })
            .collect::<Result<Vec<String>>>()?;

        view.replace_column(&self.column, ColumnData::Text(decoded))?;
        Ok(view)
    }

    fn name(&self) -> &'static str {
        "map_key_to_value"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view_with_areas(areas: &[&str]) -> DataView {
        let mut view = DataView::new();
        view.add_column(
            "Area",
            ColumnData::Text(areas.iter().map(|s| s.to_string()).collect()),
        )
        .unwrap();
        view
    }

    #[test]
    fn test_fit_builds_first_seen_vocab() {
        let view = view_with_areas(&["net", "data", "net", "infra", "data"]);
        let fitted = MapValueToKey::new("Area", "Label").fit(&view).unwrap();

        assert_eq!(fitted.vocab(), &["net", "data", "infra"]);
    }

    #[test]
    fn test_transform_encodes_with_frozen_vocab() {
        let train = view_with_areas(&["net", "data"]);
        let fitted = MapValueToKey::new("Area", "Label").fit(&train).unwrap();

        let out = fitted.transform(train).unwrap();
        let (keys, vocab) = out.key_column("Label").unwrap();
        assert_eq!(keys, &[0, 1]);
        assert_eq!(vocab, &["net".to_string(), "data".to_string()]);
    }

    #[test]
    fn test_unseen_value_encodes_to_missing_key() {
        let train = view_with_areas(&["net", "data"]);
        let fitted = MapValueToKey::new("Area", "Label").fit(&train).unwrap();

        let test = view_with_areas(&["data", "brand-new-area"]);
        let out = fitted.transform(test).unwrap();

        let (keys, _) = out.key_column("Label").unwrap();
        assert_eq!(keys, &[1, MISSING_KEY]);
    }

    #[test]
    fn test_fit_rejects_empty_column() {
        let view = view_with_areas(&[]);
        assert!(MapValueToKey::new("Area", "Label").fit(&view).is_err());
    }

    #[test]
    fn test_decode_round_trip() {
        let view = view_with_areas(&["net", "data", "net"]);
        let encode = MapValueToKey::new("Area", "Label").fit(&view).unwrap();
        let encoded = encode.transform(view).unwrap();

        let decode = MapKeyToValue::new("Label").fit(&encoded).unwrap();
        let decoded = decode.transform(encoded).unwrap();

        assert_eq!(
            decoded.text_column("Label").unwrap(),
            &["net", "data", "net"]
        );
        // Decode replaces in place, no extra column appears.
        assert_eq!(decoded.num_columns(), 2);
    }

    #[test]
    fn test_decode_missing_key_fails() {
        let mut view = DataView::new();
        view.add_column(
            "Label",
            ColumnData::Key {
                values: vec![0, MISSING_KEY],
                vocab: vec!["net".to_string()],
            },
        )
        .unwrap();

        let decode = MapKeyToValue::new("Label");
        let err = decode.transform(view).unwrap_err();
        assert!(err.to_string().contains("has no value"));
    }

    #[test]
    fn test_decode_fit_requires_key_column() {
        let view = view_with_areas(&["net"]);
        assert!(MapKeyToValue::new("Area").fit(&view).is_err());
    }
}
