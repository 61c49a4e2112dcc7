//! Maximum-entropy (multinomial logistic regression) trainer stage.
//!
//! [`MaxEntTrainer`] fits an L2-regularized maximum-entropy classifier over
//! an encoded label column and a feature-vector column, optimized by seeded
//! stochastic gradient descent with an inverse-scaling learning rate and
//! early stopping on stalled log-loss. Fitting is deterministic for a fixed
//! seed.
//!
//! The fitted [`MaxEntModel`] appends two columns on transform: a `Score`
//! vector of per-class probabilities (softmax) and a `PredictedLabel` key
//! column (argmax) that carries the label vocabulary captured at fit time,
//! so predictions always decode within the closed training label set.

use std::time::Instant;

use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::view::{ColumnData, DataView};
use crate::error::{Result, TriageError};
use crate::pipeline::Transform;

/// Name of the appended per-class probability column.
pub const SCORE_COLUMN: &str = "Score";

/// Name of the appended predicted-label key column.
pub const PREDICTED_LABEL_COLUMN: &str = "PredictedLabel";

/// Smallest probability fed into a logarithm.
///
/// Keeps log-loss finite when a class probability underflows; also the
/// penalty assigned to rows whose true label the model has never seen.
pub const PROBABILITY_FLOOR: f64 = 1e-15;

/// Configuration for maximum-entropy training.
///
/// Doubles as the declarative trainer stage: append it to a pipeline and
/// `fit` turns it into a [`MaxEntModel`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaxEntTrainer {
    /// Name of the encoded label (key) column.
    pub label_column: String,
    /// Name of the feature vector column.
    pub features_column: String,
    /// L2 regularization strength.
    pub l2: f64,
    /// Maximum number of passes over the training data.
    pub max_epochs: usize,
    /// Initial learning rate; decays as `rate / (1 + epoch)`.
    pub learning_rate: f64,
    /// Relative log-loss improvement below which training stops early.
    pub tolerance: f64,
    /// Seed for the epoch shuffles; fixes the fit outcome completely.
    pub seed: u64,
}

impl Default for MaxEntTrainer {
    fn default() -> Self {
        Self {
            label_column: "Label".to_string(),
            features_column: "Features".to_string(),
            l2: 1e-4,
            max_epochs: 50,
            learning_rate: 0.5,
            tolerance: 1e-4,
            seed: 0,
        }
    }
}

impl MaxEntTrainer {
    /// Create a trainer reading the given label and features columns.
    pub fn new<S: Into<String>>(label_column: S, features_column: S) -> Self {
        Self {
            label_column: label_column.into(),
            features_column: features_column.into(),
            ..Default::default()
        }
    }

    /// Set the L2 regularization strength.
    pub fn with_l2(mut self, l2: f64) -> Self {
        self.l2 = l2;
        self
    }

    /// Set the maximum number of epochs.
    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    /// Set the initial learning rate.
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the early-stop tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the shuffle seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the configuration parameters.
    pub fn validate(&self) -> Result<()> {
        if self.l2 < 0.0 {
            return Err(TriageError::invalid_argument("l2 must be >= 0"));
        }
        if self.max_epochs == 0 {
            return Err(TriageError::invalid_argument("max_epochs must be > 0"));
        }
        if self.learning_rate <= 0.0 {
            return Err(TriageError::invalid_argument("learning_rate must be > 0"));
        }
        if self.tolerance < 0.0 {
            return Err(TriageError::invalid_argument("tolerance must be >= 0"));
        }
        Ok(())
    }

    /// Fit the classifier on the view's label and feature columns.
    pub fn fit(&self, view: &DataView) -> Result<MaxEntModel> {
        self.validate()?;

        let (labels, vocab) = view.key_column(&self.label_column)?;
        let (dimension, rows) = view.vector_column(&self.features_column)?;

        if rows.is_empty() {
            return Err(TriageError::train("training view has no rows"));
        }
        if vocab.is_empty() {
            return Err(TriageError::train("label vocabulary is empty"));
        }
        if dimension == 0 {
            return Err(TriageError::train(
                "cannot train on zero-dimensional features",
            ));
        }
        for &label in labels {
            if label as usize >= vocab.len() {
                return Err(TriageError::train(format!(
                    "label key {label} is outside the vocabulary of {} classes",
                    vocab.len()
                )));
            }
        }

        let n_classes = vocab.len();
        let n_rows = rows.len();
        let start_time = Instant::now();

        let mut weights = vec![vec![0.0f32; dimension]; n_classes];
        let mut bias = vec![0.0f32; n_classes];
        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut order: Vec<usize> = (0..n_rows).collect();

        let mut training_losses = Vec::new();
        let mut early_stopped = false;
        let mut prev_loss = f64::INFINITY;

        for epoch in 0..self.max_epochs {
            order.shuffle(&mut rng);
            let lr = (self.learning_rate / (1.0 + epoch as f64)) as f32;
            let l2 = self.l2 as f32;

            for &i in &order {
                let mut scores = raw_scores(&weights, &bias, &rows[i]);
                softmax_in_place(&mut scores);

                for (c, class_weights) in weights.iter_mut().enumerate() {
                    let target = if labels[i] as usize == c { 1.0 } else { 0.0 };
                    let err = scores[c] - target;
                    for (w, &x) in class_weights.iter_mut().zip(rows[i].iter()) {
                        *w -= lr * (err * x + l2 * *w);
                    }
                    bias[c] -= lr * err;
                }
            }

            let loss =
                mean_log_loss(&weights, &bias, rows, labels) + l2_penalty(&weights, self.l2);
            training_losses.push(loss);

            if epoch > 0 {
                let improvement = (prev_loss - loss) / prev_loss.abs().max(PROBABILITY_FLOOR);
                if improvement.abs() < self.tolerance {
                    early_stopped = true;
                    break;
                }
            }
            prev_loss = loss;
        }

        let stats = TrainingStats {
            training_losses: training_losses.clone(),
            iterations: training_losses.len(),
            training_time_ms: start_time.elapsed().as_millis() as u64,
            final_training_loss: *training_losses.last().unwrap_or(&0.0),
            early_stopped,
        };

        debug!(
            classes = n_classes,
            dimension,
            rows = n_rows,
            epochs = stats.iterations,
            final_loss = stats.final_training_loss,
            "fitted maximum-entropy classifier"
        );

        Ok(MaxEntModel {
            label_column: self.label_column.clone(),
            features_column: self.features_column.clone(),
            classes: vocab.to_vec(),
            dimension,
            weights,
            bias,
            stats,
        })
    }
}

/// Training statistics captured while fitting.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingStats {
    /// Per-epoch regularized log-loss on the training data.
    pub training_losses: Vec<f64>,
    /// Number of epochs actually run.
    pub iterations: usize,
    /// Training wall time in milliseconds.
    pub training_time_ms: u64,
    /// Log-loss after the last epoch.
    pub final_training_loss: f64,
    /// Whether the tolerance check ended training before `max_epochs`.
    pub early_stopped: bool,
}

/// A fitted maximum-entropy classifier.
///
/// Immutable once fitted. The captured class vocabulary is closed: every
/// prediction is one of the labels seen at fit time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MaxEntModel {
    label_column: String,
    features_column: String,
    classes: Vec<String>,
    dimension: usize,
    weights: Vec<Vec<f32>>,
    bias: Vec<f32>,
    stats: TrainingStats,
}

impl MaxEntModel {
    /// The class vocabulary captured at fit time, in key order.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    /// Name of the encoded label column this model was trained on.
    pub fn label_column(&self) -> &str {
        &self.label_column
    }

    /// Expected feature dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Statistics from the fit that produced this model.
    pub fn stats(&self) -> &TrainingStats {
        &self.stats
    }

    /// Compute per-class probabilities for one feature vector.
    pub fn predict_scores(&self, features: &[f32]) -> Result<Vec<f32>> {
        if features.len() != self.dimension {
            return Err(TriageError::pipeline(format!(
                "feature dimension mismatch: model expects {}, got {}",
                self.dimension,
                features.len()
            )));
        }

        let mut scores = raw_scores(&self.weights, &self.bias, features);
        softmax_in_place(&mut scores);
        Ok(scores)
    }
}

impl Transform for MaxEntModel {
    fn transform(&self, mut view: DataView) -> Result<DataView> {
        let (dimension, rows) = view.vector_column(&self.features_column)?;
        if dimension != self.dimension {
            return Err(TriageError::pipeline(format!(
                "feature dimension mismatch: model expects {}, view has {dimension}",
                self.dimension
            )));
        }

        let mut score_rows = Vec::with_capacity(rows.len());
        let mut predicted = Vec::with_capacity(rows.len());
        for row in rows {
            let mut scores = raw_scores(&self.weights, &self.bias, row);
            softmax_in_place(&mut scores);
            predicted.push(argmax(&scores));
            score_rows.push(scores);
        }

        view.add_column(
            SCORE_COLUMN,
            ColumnData::Vector {
                dim: self.classes.len(),
                rows: score_rows,
            },
        )?;
        view.add_column(
            PREDICTED_LABEL_COLUMN,
            ColumnData::Key {
                values: predicted,
                vocab: self.classes.clone(),
            },
        )?;
        Ok(view)
    }

    fn name(&self) -> &'static str {
        "max_ent"
    }
}

fn raw_scores(weights: &[Vec<f32>], bias: &[f32], features: &[f32]) -> Vec<f32> {
    weights
        .iter()
        .zip(bias.iter())
        .map(|(class_weights, &b)| {
            class_weights
                .iter()
                .zip(features.iter())
                .map(|(&w, &x)| w * x)
                .sum::<f32>()
                + b
        })
        .collect()
}

fn softmax_in_place(scores: &mut [f32]) {
    let max = scores.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let mut sum = 0.0f32;
    for score in scores.iter_mut() {
        *score = (*score - max).exp();
        sum += *score;
    }
    for score in scores.iter_mut() {
        *score /= sum;
    }
}

fn argmax(scores: &[f32]) -> u32 {
    let mut best = 0usize;
    for (i, &score) in scores.iter().enumerate() {
        if score > scores[best] {
            best = i;
        }
    }
    best as u32
}

fn mean_log_loss(weights: &[Vec<f32>], bias: &[f32], rows: &[Vec<f32>], labels: &[u32]) -> f64 {
    let mut total = 0.0f64;
    for (row, &label) in rows.iter().zip(labels.iter()) {
        let mut scores = raw_scores(weights, bias, row);
        softmax_in_place(&mut scores);
        let p = (scores[label as usize] as f64).max(PROBABILITY_FLOOR);
        total -= p.ln();
    }
    total / rows.len() as f64
}

fn l2_penalty(weights: &[Vec<f32>], l2: f64) -> f64 {
    let sum_squares: f64 = weights
        .iter()
        .flat_map(|class_weights| class_weights.iter())
        .map(|&w| (w as f64) * (w as f64))
        .sum();
    0.5 * l2 * sum_squares
}
