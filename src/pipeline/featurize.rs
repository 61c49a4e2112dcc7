//! Text featurization stage: analyzer tokens to TF-IDF vectors.
//!
//! [`FeaturizeText`] fits a vocabulary and smoothed inverse document
//! frequencies over one text column, then transforms that column into a
//! fixed-dimension [`Vector`] column: term frequencies normalized by
//! document length, weighted by IDF, then L2-normalized. The vocabulary is
//! frozen at fit time; unseen terms contribute nothing at transform time.
//!
//! Rows are featurized in parallel with rayon; output order always matches
//! input order.
//!
//! [`Vector`]: crate::dataset::view::ColumnData::Vector

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::analysis::analyzer::{Analyzer, PipelineAnalyzer, StandardAnalyzer};
use crate::analysis::token_filter::lowercase::LowercaseFilter;
use crate::analysis::token_filter::stop::StopFilter;
use crate::analysis::tokenizer::regex::RegexTokenizer;
use crate::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
use crate::dataset::view::{ColumnData, DataView};
use crate::error::{Result, TriageError};
use crate::pipeline::Transform;

/// Serializable recipe for building an analyzer.
///
/// Fitted stages must round-trip through serde, so they carry this spec
/// and construct the analyzer chain on demand instead of holding trait
/// objects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalyzerSpec {
    /// Word tokens, lowercased, English stop words removed.
    Standard,
    /// Word tokens, lowercased, stop words kept.
    StandardNoStop,
    /// Unicode word-boundary segmentation, lowercased, stop words removed.
    Unicode,
    /// Custom token regex, lowercased.
    Pattern(String),
}

impl AnalyzerSpec {
    /// Build the analyzer this spec describes.
    pub fn build(&self) -> Result<Arc<dyn Analyzer>> {
        match self {
            AnalyzerSpec::Standard => Ok(Arc::new(StandardAnalyzer::new()?)),
            AnalyzerSpec::StandardNoStop => Ok(Arc::new(StandardAnalyzer::without_stop_words()?)),
            AnalyzerSpec::Unicode => {
                let tokenizer = Arc::new(UnicodeWordTokenizer::new());
                Ok(Arc::new(
                    PipelineAnalyzer::new(tokenizer)
                        .add_filter(Arc::new(LowercaseFilter::new()))
                        .add_filter(Arc::new(StopFilter::new()))
                        .with_name("unicode".to_string()),
                ))
            }
            AnalyzerSpec::Pattern(pattern) => {
                let tokenizer = Arc::new(RegexTokenizer::with_pattern(pattern)?);
                Ok(Arc::new(
                    PipelineAnalyzer::new(tokenizer)
                        .add_filter(Arc::new(LowercaseFilter::new()))
                        .with_name("pattern".to_string()),
                ))
            }
        }
    }
}

/// Options controlling text featurization.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeaturizeOptions {
    /// Analyzer recipe for tokenization.
    pub analyzer: AnalyzerSpec,
    /// Highest word n-gram order to include (1 = unigrams only).
    pub word_ngrams: usize,
    /// Minimum number of documents a term must appear in to enter the
    /// vocabulary.
    pub min_document_frequency: usize,
}

impl Default for FeaturizeOptions {
    fn default() -> Self {
        FeaturizeOptions {
            analyzer: AnalyzerSpec::Standard,
            word_ngrams: 1,
            min_document_frequency: 1,
        }
    }
}

impl FeaturizeOptions {
    /// Create options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the analyzer recipe.
    pub fn with_analyzer(mut self, analyzer: AnalyzerSpec) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Set the highest word n-gram order.
    pub fn with_word_ngrams(mut self, word_ngrams: usize) -> Self {
        self.word_ngrams = word_ngrams;
        self
    }

    /// Set the minimum document frequency.
    pub fn with_min_document_frequency(mut self, min_document_frequency: usize) -> Self {
        self.min_document_frequency = min_document_frequency;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.word_ngrams < 1 {
            return Err(TriageError::pipeline("word_ngrams must be at least 1"));
        }
        if self.min_document_frequency < 1 {
            return Err(TriageError::pipeline(
                "min_document_frequency must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Specification: featurize text column `input` into vector column `output`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeaturizeText {
    input: String,
    output: String,
    options: FeaturizeOptions,
}

impl FeaturizeText {
    /// Create a featurization spec with default options.
    pub fn new<S: Into<String>>(input: S, output: S) -> Self {
        Self::with_options(input, output, FeaturizeOptions::default())
    }

    /// Create a featurization spec with explicit options.
    pub fn with_options<S: Into<String>>(input: S, output: S, options: FeaturizeOptions) -> Self {
        FeaturizeText {
            input: input.into(),
            output: output.into(),
            options,
        }
    }

    /// Get the input column name.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Get the output column name.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Get the options.
    pub fn options(&self) -> &FeaturizeOptions {
        &self.options
    }

    /// Fit: build the term vocabulary and IDF table from the input column.
    ///
    /// The vocabulary keeps first-seen document order, filtered by minimum
    /// document frequency. IDF is smoothed: `ln((N + 1) / (df + 1)) + 1`.
    pub fn fit(&self, view: &DataView) -> Result<FittedFeaturizeText> {
        self.options.validate()?;
        let documents = view.text_column(&self.input)?;
        let analyzer = self.options.analyzer.build()?;

        let term_docs = analyze_documents(&analyzer, documents, self.options.word_ngrams)?;

        let mut document_frequency: AHashMap<&str, usize> = AHashMap::new();
        for terms in &term_docs {
            let unique: AHashSet<&str> = terms.iter().map(String::as_str).collect();
            for term in unique {
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        // First-seen order over documents keeps the vocabulary (and with it
        // every downstream weight vector) independent of hash iteration.
        let mut vocab: Vec<String> = Vec::new();
        let mut seen: AHashSet<&str> = AHashSet::new();
        for terms in &term_docs {
            for term in terms {
                if seen.contains(term.as_str()) {
                    continue;
                }
                if document_frequency[term.as_str()] >= self.options.min_document_frequency {
                    seen.insert(term.as_str());
                    vocab.push(term.clone());
                }
            }
        }

        if vocab.is_empty() {
            return Err(TriageError::pipeline(format!(
                "featurizing '{}' produced an empty vocabulary",
                self.input
            )));
        }

        let n_documents = documents.len();
        let idf: Vec<f32> = vocab
            .iter()
            .map(|term| {
                let df = document_frequency[term.as_str()];
                (((n_documents as f64 + 1.0) / (df as f64 + 1.0)).ln() + 1.0) as f32
            })
            .collect();

        debug!(
            input = %self.input,
            vocabulary = vocab.len(),
            documents = n_documents,
            "fitted text featurizer"
        );

        Ok(FittedFeaturizeText {
            input: self.input.clone(),
            output: self.output.clone(),
            options: self.options.clone(),
            vocab,
            idf,
            n_documents,
        })
    }
}

/// Fitted text featurizer carrying the frozen vocabulary and IDF table.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FittedFeaturizeText {
    input: String,
    output: String,
    options: FeaturizeOptions,
    vocab: Vec<String>,
    idf: Vec<f32>,
    n_documents: usize,
}

impl FittedFeaturizeText {
    /// The frozen vocabulary, in feature-index order.
    pub fn vocab(&self) -> &[String] {
        &self.vocab
    }

    /// Output vector dimension (= vocabulary size).
    pub fn dimension(&self) -> usize {
        self.vocab.len()
    }

    /// Number of documents seen at fit time.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }

    fn vectorize(&self, terms: &[String], index: &AHashMap<&str, usize>) -> Vec<f32> {
        let mut tf = vec![0.0f32; self.vocab.len()];
        for term in terms {
            if let Some(&i) = index.get(term.as_str()) {
                tf[i] += 1.0;
            }
        }

        // Normalize term counts by document length.
        let doc_length = terms.len() as f32;
        if doc_length > 0.0 {
            for value in &mut tf {
                *value /= doc_length;
            }
        }

        // Apply IDF weights.
        for (value, &idf) in tf.iter_mut().zip(self.idf.iter()) {
            *value *= idf;
        }

        // L2 normalization.
        let norm = tf.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut tf {
                *value /= norm;
            }
        }

        tf
    }
}

impl Transform for FittedFeaturizeText {
    fn transform(&self, mut view: DataView) -> Result<DataView> {
        let documents = view.text_column(&self.input)?;
        let analyzer = self.options.analyzer.build()?;

        let term_docs = analyze_documents(&analyzer, documents, self.options.word_ngrams)?;

        let index: AHashMap<&str, usize> = self
            .vocab
            .iter()
            .enumerate()
            .map(|(i, term)| (term.as_str(), i))
            .collect();

        let rows: Vec<Vec<f32>> = term_docs
            .par_iter()
            .map(|terms| self.vectorize(terms, &index))
            .collect();

        view.add_column(
            &self.output,
            ColumnData::Vector {
                dim: self.vocab.len(),
                rows,
            },
        )?;
        Ok(view)
    }

    fn name(&self) -> &'static str {
        "featurize_text"
    }
}

/// Analyze every document into its term list (tokens plus word n-grams).
///
/// Documents are processed in parallel; the output preserves input order.
fn analyze_documents(
    analyzer: &Arc<dyn Analyzer>,
    documents: &[String],
    word_ngrams: usize,
) -> Result<Vec<Vec<String>>> {
    documents
        .par_iter()
        .map(|doc| {
            let tokens: Vec<String> = analyzer.analyze(doc)?.map(|token| token.text).collect();
            Ok(terms_from_tokens(&tokens, word_ngrams))
        })
        .collect()
}

/// Expand tokens into terms: the tokens themselves plus space-joined
/// n-grams for every order from 2 up to `word_ngrams`.
fn terms_from_tokens(tokens: &[String], word_ngrams: usize) -> Vec<String> {
    let mut terms = tokens.to_vec();
    for order in 2..=word_ngrams {
        if tokens.len() < order {
            break;
        }
        for window in tokens.windows(order) {
            terms.push(window.join(" "));
        }
    }
    terms
}
