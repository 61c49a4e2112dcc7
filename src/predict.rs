//! Single-issue prediction over a trained pipeline.
//!
//! A [`PredictionEngine`] wraps a complete trained triage pipeline and
//! answers one [`IssueRecord`] at a time: it builds a single-row view,
//! runs every fitted stage, and reads back the decoded area label and
//! the per-class probabilities.

use tracing::debug;

use crate::dataset::schema::Schema;
use crate::error::{Result, TriageError};
use crate::issue::{self, IssuePrediction, IssueRecord};
use crate::pipeline::{TrainedPipeline, Transform, PREDICTED_LABEL_COLUMN, SCORE_COLUMN};

/// Applies a trained triage pipeline to single issues.
///
/// The engine owns the pipeline; predictions never mutate it, so one
/// engine can serve any number of calls.
#[derive(Debug, Clone)]
pub struct PredictionEngine {
    pipeline: TrainedPipeline,
    classes: Vec<String>,
}

impl PredictionEngine {
    /// Create an engine from a trained pipeline and the schema it was
    /// trained on.
    ///
    /// Fails if the schema lacks the issue columns or the pipeline has
    /// no classifier stage.
    pub fn new(pipeline: TrainedPipeline, schema: &Schema) -> Result<Self> {
        for name in [
            issue::TITLE_COLUMN,
            issue::DESCRIPTION_COLUMN,
            issue::AREA_COLUMN,
        ] {
            if !schema.has_column(name) {
                return Err(TriageError::pipeline(format!(
                    "model schema has no '{name}' column"
                )));
            }
        }

        let classes = match pipeline.classifier() {
            Some(model) => model.classes().to_vec(),
            None => {
                return Err(TriageError::pipeline(
                    "pipeline has no trained classifier stage",
                ));
            }
        };

        Ok(PredictionEngine { pipeline, classes })
    }

    /// The class labels that score positions refer to.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Predict the area of a single issue.
    pub fn predict(&self, record: &IssueRecord) -> Result<IssuePrediction> {
        let view = issue::single_record_view(record)?;
        let out = self.pipeline.transform(view)?;

        let area = out
            .text_column(PREDICTED_LABEL_COLUMN)?
            .first()
            .cloned()
            .ok_or_else(|| TriageError::pipeline("prediction produced no rows"))?;
        let (_, scores) = out.vector_column(SCORE_COLUMN)?;
        let scores = scores.first().cloned().unwrap_or_default();

        debug!(area = %area, "predicted issue area");
        Ok(IssuePrediction { area, scores })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::view::{ColumnData, DataView};
    use crate::issue::{issue_schema, triage_pipeline};
    use crate::pipeline::Pipeline;

    fn training_view() -> DataView {
        let titles = vec![
            "sql timeout",
            "ef migration fails",
            "database deadlock",
            "http handler hangs",
            "socket reset",
            "kestrel port conflict",
        ];
        let descriptions = vec![
            "the database query hits a timeout",
            "database migration fails to apply",
            "deadlock on concurrent database writes",
            "the http request never completes",
            "connection reset on long http requests",
            "http server cannot bind the port",
        ];
        let areas = vec![
            "area-System.Data",
            "area-System.Data",
            "area-System.Data",
            "area-System.Net",
            "area-System.Net",
            "area-System.Net",
        ];

        let mut view = DataView::new();
        view.add_column(
            issue::TITLE_COLUMN,
            ColumnData::Text(titles.into_iter().map(String::from).collect()),
        )
        .unwrap();
        view.add_column(
            issue::DESCRIPTION_COLUMN,
            ColumnData::Text(descriptions.into_iter().map(String::from).collect()),
        )
        .unwrap();
        view.add_column(
            issue::AREA_COLUMN,
            ColumnData::Text(areas.into_iter().map(String::from).collect()),
        )
        .unwrap();
        view
    }

    fn engine_fixture() -> PredictionEngine {
        let trained = triage_pipeline().fit(&training_view()).unwrap();
        PredictionEngine::new(trained, &issue_schema()).unwrap()
    }

    #[test]
    fn test_predict_data_issue() {
        let engine = engine_fixture();
        let record = IssueRecord::new("ef core crashes", "database migration throws on startup");

        let prediction = engine.predict(&record).unwrap();
        assert_eq!(prediction.area, "area-System.Data");

        let total: f32 = prediction.scores.iter().sum();
        assert!((total - 1.0).abs() < 1e-5);
        assert_eq!(prediction.scores.len(), engine.classes().len());
    }

    #[test]
    fn test_predict_web_issue() {
        let engine = engine_fixture();
        let record = IssueRecord::new("http request stalls", "socket connection hangs");

        let prediction = engine.predict(&record).unwrap();
        assert_eq!(prediction.area, "area-System.Net");
    }

    #[test]
    fn test_classes_follow_training_order() {
        let engine = engine_fixture();
        assert_eq!(
            engine.classes(),
            &["area-System.Data".to_string(), "area-System.Net".to_string()]
        );
    }

    #[test]
    fn test_area_field_does_not_influence_prediction() {
        let engine = engine_fixture();
        let unlabeled = IssueRecord::new("http request stalls", "socket connection hangs");
        let labeled = unlabeled.clone().with_area("area-System.Data");

        let a = engine.predict(&unlabeled).unwrap();
        let b = engine.predict(&labeled).unwrap();

        assert_eq!(a.area, b.area);
        assert_eq!(a.scores, b.scores);
    }

    #[test]
    fn test_engine_requires_classifier() {
        let pipeline = Pipeline::new()
            .append(crate::pipeline::StageSpec::map_value_to_key(
                issue::AREA_COLUMN,
                issue::LABEL_COLUMN,
            ))
            .fit(&training_view())
            .unwrap();

        let err = PredictionEngine::new(pipeline, &issue_schema()).unwrap_err();
        assert!(err.to_string().contains("no trained classifier"));
    }
}
