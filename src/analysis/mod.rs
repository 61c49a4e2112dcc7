//! Text analysis module for triage.
//!
//! This module provides the tokenization, filtering, and analyzer pipeline
//! that turns raw issue text into the token streams consumed by the text
//! featurizer. It is a deliberately small chain: tokenizers split text,
//! token filters normalize the stream, and analyzers bundle the two behind
//! a single `analyze` call.

pub mod analyzer;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

// Re-export commonly used types
pub use analyzer::*;
pub use token::*;
pub use token_filter::*;
pub use tokenizer::*;
