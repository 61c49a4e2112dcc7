//! Multiclass classification evaluation.
//!
//! Applies a trained pipeline to a held-out test set and computes the four
//! headline metrics: micro accuracy, macro accuracy, log-loss, and log-loss
//! reduction against the prior predictor that always emits the test set's
//! empirical class distribution. Per-class log-loss is computed alongside.
//!
//! Test rows whose true label was never seen at fit time key-encode to the
//! missing-key sentinel: they can never count as correct and contribute the
//! clamp penalty to log-loss.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::loader::TextLoader;
use crate::dataset::schema::Schema;
use crate::dataset::view::DataView;
use crate::error::{Result, TriageError};
use crate::pipeline::maxent::{PROBABILITY_FLOOR, SCORE_COLUMN};
use crate::pipeline::{TrainedPipeline, Transform};

/// Log-loss for a single class, over the test rows of that class.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PerClassLogLoss {
    /// Decoded class label.
    pub class: String,
    /// Mean negative log probability assigned to this class.
    pub log_loss: f64,
    /// Number of test rows with this true class.
    pub support: usize,
}

/// Metrics for a multiclass classification model on a test set.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MulticlassMetrics {
    /// Fraction of rows predicted correctly.
    pub micro_accuracy: f64,
    /// Mean per-class recall, over classes present in the test labels.
    pub macro_accuracy: f64,
    /// Mean negative log probability of the true class.
    pub log_loss: f64,
    /// Relative improvement of `log_loss` over the prior predictor.
    pub log_loss_reduction: f64,
    /// Per-class log-loss, for classes present in the test labels.
    pub per_class_log_loss: Vec<PerClassLogLoss>,
}

impl fmt::Display for MulticlassMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "*************************************************************************************************************"
        )?;
        writeln!(
            f,
            "*       Metrics for Multi-class Classification model - Test Data     "
        )?;
        writeln!(
            f,
            "*------------------------------------------------------------------------------------------------------------"
        )?;
        writeln!(f, "*       MicroAccuracy:    {:.3}", self.micro_accuracy)?;
        writeln!(f, "*       MacroAccuracy:    {:.3}", self.macro_accuracy)?;
        writeln!(f, "*       LogLoss:          {:.3}", self.log_loss)?;
        writeln!(f, "*       LogLossReduction: {:.3}", self.log_loss_reduction)?;
        write!(
            f,
            "*************************************************************************************************************"
        )
    }
}

/// Evaluate a trained pipeline against a test file.
///
/// The file is loaded through the given schema (with a header row), exactly
/// as the training data was, so a structurally incompatible test file fails
/// here rather than producing meaningless numbers.
pub fn evaluate<P: AsRef<Path>>(
    trained: &TrainedPipeline,
    schema: &Schema,
    test_path: P,
) -> Result<MulticlassMetrics> {
    let loader = TextLoader::new(schema.clone()).with_header(true);
    let view = loader.load(test_path)?;
    evaluate_view(trained, view)
}

/// Evaluate a trained pipeline against an already loaded view.
pub fn evaluate_view(trained: &TrainedPipeline, view: DataView) -> Result<MulticlassMetrics> {
    let model = trained.classifier().ok_or_else(|| {
        TriageError::invalid_argument("pipeline has no trained classifier stage")
    })?;
    let label_column = model.label_column().to_string();
    let n_classes = model.classes().len();
    let classes: Vec<String> = model.classes().to_vec();

    let transformed = trained.transform(view)?;
    let (true_keys, _) = transformed.key_column(&label_column)?;
    let (score_dim, scores) = transformed.vector_column(SCORE_COLUMN)?;

    if score_dim != n_classes {
        return Err(TriageError::pipeline(format!(
            "score column has dimension {score_dim}, model has {n_classes} classes"
        )));
    }

    compute_metrics(true_keys, scores, &classes)
}

fn compute_metrics(
    true_keys: &[u32],
    scores: &[Vec<f32>],
    classes: &[String],
) -> Result<MulticlassMetrics> {
    let n_rows = true_keys.len();
    if n_rows == 0 {
        return Err(TriageError::invalid_argument(
            "cannot evaluate on an empty test set",
        ));
    }
    let n_classes = classes.len();

    let mut correct = 0usize;
    let mut correct_per_class = vec![0usize; n_classes];
    let mut support = vec![0usize; n_classes];
    let mut total_log_loss = 0.0f64;
    let mut class_log_loss = vec![0.0f64; n_classes];

    for (row_scores, &true_key) in scores.iter().zip(true_keys.iter()) {
        let predicted = argmax(row_scores);

        let true_class = true_key as usize;
        if true_class < n_classes {
            support[true_class] += 1;
            if predicted == true_class {
                correct += 1;
                correct_per_class[true_class] += 1;
            }
            let p = (row_scores[true_class] as f64).max(PROBABILITY_FLOOR);
            total_log_loss -= p.ln();
            class_log_loss[true_class] -= p.ln();
        } else {
            // True label outside the training vocabulary: never correct,
            // and the model assigns it probability zero.
            total_log_loss -= PROBABILITY_FLOOR.ln();
        }
    }

    let micro_accuracy = correct as f64 / n_rows as f64;

    let recalls: Vec<f64> = (0..n_classes)
        .filter(|&c| support[c] > 0)
        .map(|c| correct_per_class[c] as f64 / support[c] as f64)
        .collect();
    let macro_accuracy = if recalls.is_empty() {
        0.0
    } else {
        recalls.iter().sum::<f64>() / recalls.len() as f64
    };

    let log_loss = total_log_loss / n_rows as f64;

    // Prior predictor: always emit the test set's empirical distribution.
    let mut prior_log_loss = 0.0f64;
    for &true_key in true_keys {
        let true_class = true_key as usize;
        let prior = if true_class < n_classes {
            (support[true_class] as f64 / n_rows as f64).max(PROBABILITY_FLOOR)
        } else {
            PROBABILITY_FLOOR
        };
        prior_log_loss -= prior.ln();
    }
    prior_log_loss /= n_rows as f64;

    let log_loss_reduction = if prior_log_loss > 0.0 {
        (prior_log_loss - log_loss) / prior_log_loss
    } else {
        0.0
    };

    let per_class_log_loss = (0..n_classes)
        .filter(|&c| support[c] > 0)
        .map(|c| PerClassLogLoss {
            class: classes[c].clone(),
            log_loss: class_log_loss[c] / support[c] as f64,
            support: support[c],
        })
        .collect();

    debug!(
        rows = n_rows,
        micro_accuracy, macro_accuracy, log_loss, "evaluated model"
    );

    Ok(MulticlassMetrics {
        micro_accuracy,
        macro_accuracy,
        log_loss,
        log_loss_reduction,
        per_class_log_loss,
    })
}

fn argmax(scores: &[f32]) -> usize {
    let mut best = 0usize;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = i;
        }
    }
    best
}
