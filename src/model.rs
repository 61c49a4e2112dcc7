//! Trained model persistence.
//!
//! A trained pipeline is written to disk as a single framed binary
//! artifact: magic bytes, a format version, a length-prefixed bincode
//! payload, and a CRC32 checksum over the payload. [`load_model`]
//! verifies the frame before decoding and refuses files with a bad
//! magic, an unsupported version, a truncated payload, or a checksum
//! mismatch.
//!
//! The payload is a [`SavedModel`]: the fitted pipeline together with
//! the input schema it was trained on and training metadata, so a
//! loaded model carries everything needed to evaluate and predict.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::schema::Schema;
use crate::error::{Result, TriageError};
use crate::pipeline::TrainedPipeline;

/// Magic bytes at the start of every model artifact.
pub const MODEL_MAGIC: [u8; 4] = *b"TRIA";

/// Artifact format version written by this build.
pub const MODEL_FORMAT_VERSION: u32 = 1;

/// Frame bytes surrounding the payload: magic, version, payload length,
/// trailing checksum.
const FRAME_LEN: u64 = 4 + 4 + 8 + 4;

/// Metadata recorded alongside a saved pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Version of the crate that trained the model.
    pub version: String,
    /// Training timestamp.
    pub trained_at: DateTime<Utc>,
    /// Number of rows the model was trained on.
    pub training_rows: usize,
    /// Number of label classes.
    pub num_classes: usize,
    /// Dimensionality of the concatenated feature vector.
    pub feature_dimension: usize,
}

/// A trained pipeline bundled with its input schema and metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedModel {
    /// Metadata captured at save time.
    pub metadata: ModelMetadata,
    /// Schema the pipeline's input views must match.
    pub schema: Schema,
    /// The fitted pipeline.
    pub pipeline: TrainedPipeline,
}

impl SavedModel {
    /// Bundle a trained pipeline with the schema its inputs must match.
    ///
    /// Class count and feature dimension are read from the pipeline's
    /// classifier stage; both are zero for a pipeline without one.
    pub fn new(pipeline: TrainedPipeline, schema: Schema, training_rows: usize) -> Self {
        let (num_classes, feature_dimension) = match pipeline.classifier() {
            Some(model) => (model.classes().len(), model.dimension()),
            None => (0, 0),
        };

        SavedModel {
            metadata: ModelMetadata {
                version: crate::VERSION.to_string(),
                trained_at: Utc::now(),
                training_rows,
                num_classes,
                feature_dimension,
            },
            schema,
            pipeline,
        }
    }
}

/// Save a model artifact to `path`, creating parent directories as needed.
pub fn save_model<P: AsRef<Path>>(model: &SavedModel, path: P) -> Result<()> {
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let payload = bincode::serialize(model)
        .map_err(|e| TriageError::model(format!("cannot encode model: {e}")))?;
    let checksum = crc32fast::hash(&payload);

    let file = File::create(path).map_err(|e| {
        TriageError::model(format!(
            "cannot create model file '{}': {e}",
            path.display()
        ))
    })?;
    let mut writer = BufWriter::new(file);

    writer.write_all(&MODEL_MAGIC)?;
    writer.write_u32::<LittleEndian>(MODEL_FORMAT_VERSION)?;
    writer.write_u64::<LittleEndian>(payload.len() as u64)?;
    writer.write_all(&payload)?;
    writer.write_u32::<LittleEndian>(checksum)?;
    writer.flush()?;

    debug!(
        path = %path.display(),
        payload_bytes = payload.len(),
        "saved model artifact"
    );
    Ok(())
}

/// Load a model artifact from `path`, verifying the frame before decoding.
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<SavedModel> {
    let path = path.as_ref();

    let file = File::open(path).map_err(|e| {
        TriageError::model(format!("cannot open model file '{}': {e}", path.display()))
    })?;
    let file_size = file.metadata()?.len();
    let mut reader = BufReader::new(file);

    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic).map_err(|_| truncated(path))?;
    if magic != MODEL_MAGIC {
        return Err(TriageError::model(format!(
            "'{}' is not a model artifact (bad magic)",
            path.display()
        )));
    }

    let version = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| truncated(path))?;
    if version != MODEL_FORMAT_VERSION {
        return Err(TriageError::model(format!(
            "model file '{}' has unsupported format version {version} (expected {MODEL_FORMAT_VERSION})",
            path.display()
        )));
    }

    let payload_len = reader
        .read_u64::<LittleEndian>()
        .map_err(|_| truncated(path))?;
    if payload_len > file_size.saturating_sub(FRAME_LEN) {
        return Err(truncated(path));
    }

    let mut payload = vec![0u8; payload_len as usize];
    reader
        .read_exact(&mut payload)
        .map_err(|_| truncated(path))?;

    let stored = reader
        .read_u32::<LittleEndian>()
        .map_err(|_| truncated(path))?;
    let computed = crc32fast::hash(&payload);
    if stored != computed {
        return Err(TriageError::model(format!(
            "model file '{}' is corrupt: checksum mismatch (stored {stored:#010x}, computed {computed:#010x})",
            path.display()
        )));
    }

    let model: SavedModel = bincode::deserialize(&payload).map_err(|e| {
        TriageError::model(format!(
            "cannot decode model file '{}': {e}",
            path.display()
        ))
    })?;

    debug!(path = %path.display(), "loaded model artifact");
    Ok(model)
}

fn truncated(path: &Path) -> TriageError {
    TriageError::model(format!("model file '{}' is truncated", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::schema::ColumnKind;
    use crate::dataset::view::{ColumnData, DataView};
    use crate::pipeline::{MaxEntTrainer, Pipeline, StageSpec, Transform, SCORE_COLUMN};

    fn issue_schema() -> Schema {
        let mut schema = Schema::new();
        schema.add_column("Title", ColumnKind::Text).unwrap();
        schema.add_column("Area", ColumnKind::Text).unwrap();
        schema
    }

    fn training_view() -> DataView {
        let mut view = DataView::new();
        view.add_column(
            "Title",
            ColumnData::Text(vec![
                "sql timeout".to_string(),
                "sql deadlock".to_string(),
                "http request".to_string(),
                "http socket".to_string(),
            ]),
        )
        .unwrap();
        view.add_column(
            "Area",
            ColumnData::Text(vec![
                "area-System.Data".to_string(),
                "area-System.Data".to_string(),
                "area-System.Net".to_string(),
                "area-System.Net".to_string(),
            ]),
        )
        .unwrap();
        view
    }

    fn trained_fixture() -> (TrainedPipeline, DataView) {
        let view = training_view();
        let pipeline = Pipeline::new()
            .append(StageSpec::map_value_to_key("Area", "Label"))
            .append(StageSpec::featurize_text("Title", "Features"))
            .append(StageSpec::max_ent(MaxEntTrainer::new("Label", "Features")));
        let trained = pipeline.fit(&view).unwrap();
        (trained, view)
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("issue_model.bin");
        let (trained, view) = trained_fixture();

        let saved = SavedModel::new(trained.clone(), issue_schema(), view.num_rows());
        save_model(&saved, &path).unwrap();
        let loaded = load_model(&path).unwrap();

        assert_eq!(loaded.schema, issue_schema());
        assert_eq!(loaded.metadata.training_rows, 4);
        assert_eq!(loaded.metadata.num_classes, 2);
        assert_eq!(
            loaded.metadata.feature_dimension,
            trained.classifier().unwrap().dimension()
        );

        // The reloaded pipeline scores inputs exactly like the original.
        let before = trained.transform(view.clone()).unwrap();
        let after = loaded.pipeline.transform(view).unwrap();
        assert_eq!(
            before.vector_column(SCORE_COLUMN).unwrap(),
            after.vector_column(SCORE_COLUMN).unwrap()
        );
    }

    #[test]
    fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("nested").join("model.bin");
        let (trained, view) = trained_fixture();

        let saved = SavedModel::new(trained, issue_schema(), view.num_rows());
        save_model(&saved, &path).unwrap();

        assert!(path.exists());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_model("no/such/model.bin").unwrap_err();
        assert!(err.to_string().contains("cannot open model file"));
    }

    #[test]
    fn test_load_rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk.bin");
        std::fs::write(&path, b"JUNK and then some more bytes").unwrap();

        let err = load_model(&path).unwrap_err();
        assert!(err.to_string().contains("not a model artifact"));
    }

    #[test]
    fn test_load_rejects_unsupported_version() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.bin");

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&MODEL_MAGIC);
        bytes.extend_from_slice(&99u32.to_le_bytes());
        bytes.extend_from_slice(&0u64.to_le_bytes());
        bytes.extend_from_slice(&0u32.to_le_bytes());
        std::fs::write(&path, &bytes).unwrap();

        let err = load_model(&path).unwrap_err();
        assert!(err.to_string().contains("format version 99"));
    }

    #[test]
    fn test_load_rejects_flipped_payload_byte() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flipped.bin");
        let (trained, view) = trained_fixture();

        let saved = SavedModel::new(trained, issue_schema(), view.num_rows());
        save_model(&saved, &path).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let i = 16 + 5; // a few bytes into the payload
        bytes[i] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();

        let err = load_model(&path).unwrap_err();
        assert!(err.to_string().contains("checksum mismatch"));
    }

    #[test]
    fn test_load_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cut.bin");
        let (trained, view) = trained_fixture();

        let saved = SavedModel::new(trained, issue_schema(), view.num_rows());
        save_model(&saved, &path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 7]).unwrap();

        let err = load_model(&path).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }
}
