//! GitHub issue records and the canonical triage pipeline.
//!
//! The triage datasets are TSV files with three text columns: `Title`,
//! `Description`, and the `Area` label to predict. This module defines
//! the record types for single issues, the dataset schema, the column
//! names every stage agrees on, and the builders for the standard
//! pipeline: key-encode the label, featurize title and description
//! separately, concatenate both vectors, checkpoint, classify, and
//! decode the prediction back to an area name.
//!
//! # Examples
//!
//! ```
//! use triage::issue;
//!
//! let pipeline = issue::triage_pipeline();
//! assert_eq!(pipeline.len(), 7);
//! assert_eq!(pipeline.stages()[0].name(), "map_value_to_key");
//! ```

use serde::{Deserialize, Serialize};

use crate::dataset::schema::{ColumnKind, Schema};
use crate::dataset::view::{ColumnData, DataView};
use crate::error::Result;
use crate::pipeline::{
    MaxEntTrainer, Pipeline, StageSpec, PREDICTED_LABEL_COLUMN,
};

/// Issue title column.
pub const TITLE_COLUMN: &str = "Title";

/// Issue body column.
pub const DESCRIPTION_COLUMN: &str = "Description";

/// Area label column as it appears in the datasets.
pub const AREA_COLUMN: &str = "Area";

/// Key-encoded area label used for training.
pub const LABEL_COLUMN: &str = "Label";

/// Feature vector derived from the title.
pub const TITLE_FEATURES_COLUMN: &str = "TitleFeaturized";

/// Feature vector derived from the description.
pub const DESCRIPTION_FEATURES_COLUMN: &str = "DescriptionFeaturized";

/// Concatenated feature vector the classifier trains on.
pub const FEATURES_COLUMN: &str = "Features";

/// A GitHub issue as read from the datasets or passed in for prediction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IssueRecord {
    /// Issue title.
    pub title: String,
    /// Issue body text.
    pub description: String,
    /// Area label; absent for issues awaiting prediction.
    pub area: Option<String>,
}

impl IssueRecord {
    /// Create an unlabeled record.
    pub fn new<S: Into<String>>(title: S, description: S) -> Self {
        IssueRecord {
            title: title.into(),
            description: description.into(),
            area: None,
        }
    }

    /// Attach the known area label.
    pub fn with_area<S: Into<String>>(mut self, area: S) -> Self {
        self.area = Some(area.into());
        self
    }
}

/// The predicted area for a single issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssuePrediction {
    /// The winning area label.
    pub area: String,
    /// Per-class probabilities, aligned with the model's class order.
    pub scores: Vec<f32>,
}

/// Schema of the issue datasets: three text columns.
pub fn issue_schema() -> Schema {
    let mut schema = Schema::new();
    for name in [TITLE_COLUMN, DESCRIPTION_COLUMN, AREA_COLUMN] {
        schema
            .add_column(name, ColumnKind::Text)
            .expect("issue schema column names are distinct and non-empty");
    }
    schema
}

/// Build the data-preparation half of the triage pipeline.
///
/// Key-encodes `Area` into `Label`, featurizes `Title` and `Description`
/// into separate vectors, concatenates them into `Features`, and ends
/// with a cache checkpoint so the classifier trains over materialized
/// features.
pub fn process_pipeline() -> Pipeline {
    Pipeline::new()
        .append(StageSpec::map_value_to_key(AREA_COLUMN, LABEL_COLUMN))
        .append(StageSpec::featurize_text(TITLE_COLUMN, TITLE_FEATURES_COLUMN))
        .append(StageSpec::featurize_text(
            DESCRIPTION_COLUMN,
            DESCRIPTION_FEATURES_COLUMN,
        ))
        .append(StageSpec::concatenate(
            vec![TITLE_FEATURES_COLUMN, DESCRIPTION_FEATURES_COLUMN],
            FEATURES_COLUMN,
        ))
        .append(StageSpec::cache_checkpoint())
}

/// Build the complete triage pipeline: data preparation composed with
/// the classifier and the key-decode of its prediction.
///
/// The classifier shuffles with a fixed seed, so repeated fits over the
/// same data agree exactly.
pub fn triage_pipeline() -> Pipeline {
    let classifier = Pipeline::new()
        .append(StageSpec::max_ent(
            MaxEntTrainer::new(LABEL_COLUMN, FEATURES_COLUMN).with_seed(0),
        ))
        .append(StageSpec::map_key_to_value(PREDICTED_LABEL_COLUMN));
    process_pipeline().compose(classifier)
}

/// Build a single-row view from one record.
///
/// A record without an area gets an empty `Area` cell; the trained
/// key-encode stage maps it to the missing key, which prediction
/// never reads.
pub fn single_record_view(record: &IssueRecord) -> Result<DataView> {
    let mut view = DataView::new();
    view.add_column(TITLE_COLUMN, ColumnData::Text(vec![record.title.clone()]))?;
    view.add_column(
        DESCRIPTION_COLUMN,
        ColumnData::Text(vec![record.description.clone()]),
    )?;
    view.add_column(
        AREA_COLUMN,
        ColumnData::Text(vec![record.area.clone().unwrap_or_default()]),
    )?;
    Ok(view)
}
