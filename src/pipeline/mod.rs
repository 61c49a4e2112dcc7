//! Column-transform pipeline: declarative stage specifications that fit
//! into immutable, serializable transforms.
//!
//! A [`Pipeline`] is an ordered list of [`StageSpec`]s and computes nothing
//! until [`Pipeline::fit`] runs. Fitting walks the stages in order: each
//! stage is fitted against the view produced by its predecessors, then its
//! fitted form transforms the view for the next stage. The result is a
//! [`TrainedPipeline`] of [`FittedStage`]s, each an immutable value, which
//! can be applied to any schema-compatible view and round-trips through
//! serde for persistence.
//!
//! # Examples
//!
//! ```
//! use triage::dataset::view::{ColumnData, DataView};
//! use triage::pipeline::{Pipeline, StageSpec, Transform};
//!
//! let mut view = DataView::new();
//! view.add_column(
//!     "Area",
//!     ColumnData::Text(vec!["area-System.Net".into(), "area-System.Data".into()]),
//! )
//! .unwrap();
//!
//! let pipeline = Pipeline::new().append(StageSpec::map_value_to_key("Area", "Label"));
//! let trained = pipeline.fit(&view).unwrap();
//! let out = trained.transform(view).unwrap();
//!
//! let (keys, vocab) = out.key_column("Label").unwrap();
//! assert_eq!(keys, &[0, 1]);
//! assert_eq!(vocab[0], "area-System.Net");
//! ```

pub mod cache;
pub mod concat;
pub mod featurize;
pub mod key;
pub mod maxent;

pub use cache::*;
pub use concat::*;
pub use featurize::*;
pub use key::*;
pub use maxent::*;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::view::DataView;
use crate::error::Result;

/// A fitted column transform.
///
/// Transforms take a view by value and return it with columns appended (or,
/// for the key-decode stage, replaced). Applying a transform is pure: the
/// same input view always yields the same output.
pub trait Transform {
    /// Apply this transform to a view.
    fn transform(&self, view: DataView) -> Result<DataView>;

    /// Get the name of this transform (for logs and error messages).
    fn name(&self) -> &'static str;
}

/// Declarative specification of a single pipeline stage.
///
/// Specs are pure data: constructing and appending them performs no work.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum StageSpec {
    /// Encode a text column into dense categorical keys.
    MapValueToKey(MapValueToKey),
    /// Turn a text column into TF-IDF feature vectors.
    FeaturizeText(FeaturizeText),
    /// Concatenate vector columns into one.
    Concatenate(Concatenate),
    /// Marker where upstream recomputation stops.
    CacheCheckpoint(CacheCheckpoint),
    /// Fit a maximum-entropy classifier over label and feature columns.
    MaxEnt(MaxEntTrainer),
    /// Decode a key column back to its original values.
    MapKeyToValue(MapKeyToValue),
}

impl StageSpec {
    /// Key-encode `input` into a new `output` column.
    pub fn map_value_to_key<S: Into<String>>(input: S, output: S) -> Self {
        StageSpec::MapValueToKey(MapValueToKey::new(input, output))
    }

    /// Featurize text column `input` into vector column `output` with
    /// default options.
    pub fn featurize_text<S: Into<String>>(input: S, output: S) -> Self {
        StageSpec::FeaturizeText(FeaturizeText::new(input, output))
    }

    /// Featurize with explicit options.
    pub fn featurize_text_with_options<S: Into<String>>(
        input: S,
        output: S,
        options: FeaturizeOptions,
    ) -> Self {
        StageSpec::FeaturizeText(FeaturizeText::with_options(input, output, options))
    }

    /// Concatenate the `inputs` vector columns into `output`.
    pub fn concatenate<S: Into<String>>(inputs: Vec<S>, output: S) -> Self {
        StageSpec::Concatenate(Concatenate::new(inputs, output))
    }

    /// Insert a cache checkpoint marker.
    pub fn cache_checkpoint() -> Self {
        StageSpec::CacheCheckpoint(CacheCheckpoint::new())
    }

    /// Train a maximum-entropy classifier.
    pub fn max_ent(trainer: MaxEntTrainer) -> Self {
        StageSpec::MaxEnt(trainer)
    }

    /// Decode the named key column back to its original string values.
    pub fn map_key_to_value<S: Into<String>>(column: S) -> Self {
        StageSpec::MapKeyToValue(MapKeyToValue::new(column))
    }

    /// Get the name of this stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageSpec::MapValueToKey(_) => "map_value_to_key",
            StageSpec::FeaturizeText(_) => "featurize_text",
            StageSpec::Concatenate(_) => "concatenate",
            StageSpec::CacheCheckpoint(_) => "cache_checkpoint",
            StageSpec::MaxEnt(_) => "max_ent",
            StageSpec::MapKeyToValue(_) => "map_key_to_value",
        }
    }

    /// Fit this stage against a view, producing its fitted form.
    pub fn fit(&self, view: &DataView) -> Result<FittedStage> {
        let fitted = match self {
            StageSpec::MapValueToKey(spec) => FittedStage::MapValueToKey(spec.fit(view)?),
            StageSpec::FeaturizeText(spec) => FittedStage::FeaturizeText(spec.fit(view)?),
            StageSpec::Concatenate(spec) => FittedStage::Concatenate(spec.fit(view)?),
            StageSpec::CacheCheckpoint(spec) => FittedStage::CacheCheckpoint(spec.clone()),
            StageSpec::MaxEnt(spec) => FittedStage::MaxEnt(spec.fit(view)?),
            StageSpec::MapKeyToValue(spec) => FittedStage::MapKeyToValue(spec.fit(view)?),
        };
        Ok(fitted)
    }
}

/// The fitted counterpart of a [`StageSpec`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum FittedStage {
    MapValueToKey(FittedMapValueToKey),
    FeaturizeText(FittedFeaturizeText),
    Concatenate(Concatenate),
    CacheCheckpoint(CacheCheckpoint),
    MaxEnt(MaxEntModel),
    MapKeyToValue(MapKeyToValue),
}

impl Transform for FittedStage {
    fn transform(&self, view: DataView) -> Result<DataView> {
        match self {
            FittedStage::MapValueToKey(stage) => stage.transform(view),
            FittedStage::FeaturizeText(stage) => stage.transform(view),
            FittedStage::Concatenate(stage) => stage.transform(view),
            FittedStage::CacheCheckpoint(stage) => stage.transform(view),
            FittedStage::MaxEnt(stage) => stage.transform(view),
            FittedStage::MapKeyToValue(stage) => stage.transform(view),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            FittedStage::MapValueToKey(stage) => stage.name(),
            FittedStage::FeaturizeText(stage) => stage.name(),
            FittedStage::Concatenate(stage) => stage.name(),
            FittedStage::CacheCheckpoint(stage) => stage.name(),
            FittedStage::MaxEnt(stage) => stage.name(),
            FittedStage::MapKeyToValue(stage) => stage.name(),
        }
    }
}

/// An ordered, declarative pipeline of stage specifications.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Pipeline {
    stages: Vec<StageSpec>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Pipeline { stages: Vec::new() }
    }

    /// Append a stage, returning the extended pipeline.
    pub fn append(mut self, stage: StageSpec) -> Self {
        self.stages.push(stage);
        self
    }

    /// Compose with another pipeline: this pipeline's stages followed by
    /// all of `other`'s.
    pub fn compose(mut self, other: Pipeline) -> Self {
        self.stages.extend(other.stages);
        self
    }

    /// Get the stage specifications in order.
    pub fn stages(&self) -> &[StageSpec] {
        &self.stages
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Fit every stage in order against `view`.
    ///
    /// Each stage is fitted on the view as transformed by its predecessors,
    /// then applied, so later stages see the columns earlier stages
    /// produced. The input view is not modified.
    pub fn fit(&self, view: &DataView) -> Result<TrainedPipeline> {
        let mut current = view.clone();
        let mut fitted = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            debug!(stage = stage.name(), "fitting pipeline stage");
            let fitted_stage = stage.fit(&current)?;
            current = fitted_stage.transform(current)?;
            fitted.push(fitted_stage);
        }

        Ok(TrainedPipeline { stages: fitted })
    }
}

/// An ordered sequence of fitted stages.
///
/// Produced by [`Pipeline::fit`]; immutable thereafter. Applying it to a
/// schema-compatible view runs every stage in order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainedPipeline {
    stages: Vec<FittedStage>,
}

impl TrainedPipeline {
    /// Get the fitted stages in order.
    pub fn stages(&self) -> &[FittedStage] {
        &self.stages
    }

    /// Find the trained classifier stage, if the pipeline has one.
    pub fn classifier(&self) -> Option<&MaxEntModel> {
        self.stages.iter().find_map(|stage| match stage {
            FittedStage::MaxEnt(model) => Some(model),
            _ => None,
        })
    }
}

impl Transform for TrainedPipeline {
    fn transform(&self, view: DataView) -> Result<DataView> {
        let mut current = view;
        for stage in &self.stages {
            current = stage.transform(current)?;
        }
        Ok(current)
    }

    fn name(&self) -> &'static str {
        "trained_pipeline"
    }
}
