//! Dataset loading and in-memory tabular views.
//!
//! This module provides the schema-driven TSV loader and the columnar
//! `DataView` container that pipeline stages read from and append to.
//! Views are fully materialized in memory, re-enumerable, and discarded
//! after use.

pub mod loader;
pub mod schema;
pub mod view;

// Re-export commonly used types
pub use loader::*;
pub use schema::*;
pub use view::*;
