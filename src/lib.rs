//! # Triage
//!
//! A multiclass text classification library for GitHub issue triage.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - TSV dataset loading into columnar views
//! - Declarative fit/transform pipelines
//! - TF-IDF text featurization with a pluggable analysis pipeline
//! - Maximum-entropy classification
//! - Micro/macro accuracy and log-loss evaluation
//! - Framed, checksummed model artifacts

pub mod analysis;
pub mod cli;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod issue;
pub mod model;
pub mod pipeline;
pub mod predict;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
