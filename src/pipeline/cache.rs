//! Cache checkpoint stage.

use serde::{Deserialize, Serialize};

use crate::dataset::view::DataView;
use crate::error::Result;
use crate::pipeline::Transform;

/// Marker stage: everything upstream of this point is considered settled
/// and is not recomputed by downstream passes.
///
/// Views in this crate are fully materialized in memory, so the checkpoint
/// passes its view through unchanged. It stays in the pipeline to keep the
/// declared flow explicit about where the (possibly repeated) training
/// passes begin.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CacheCheckpoint;

impl CacheCheckpoint {
    /// Create a new cache checkpoint marker.
    pub fn new() -> Self {
        CacheCheckpoint
    }
}

impl Transform for CacheCheckpoint {
    fn transform(&self, view: DataView) -> Result<DataView> {
        Ok(view)
    }

    fn name(&self) -> &'static str {
        "cache_checkpoint"
    }
}
