//! Command line argument parsing for the triage CLI using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Default path of the training dataset.
pub const DEFAULT_TRAIN_PATH: &str = "data/issues_train.tsv";

/// Default path of the test dataset.
pub const DEFAULT_TEST_PATH: &str = "data/issues_test.tsv";

/// Default path of the saved model artifact.
pub const DEFAULT_MODEL_PATH: &str = "model/issue_model.bin";

/// Triage - GitHub issue area classification
#[derive(Parser, Debug, Clone)]
#[command(name = "triage")]
#[command(about = "Train and apply a GitHub issue area classifier")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct TriageArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl TriageArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1, // Default to normal
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train, evaluate, save, reload, and predict in one pass
    Run(RunArgs),

    /// Train a model and save the artifact
    Train(TrainArgs),

    /// Evaluate a saved model against a test dataset
    Evaluate(EvaluateArgs),

    /// Predict the area of a single issue with a saved model
    Predict(PredictArgs),
}

/// Arguments for the full train-evaluate-predict pass
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Training dataset (TSV with Title, Description, Area columns)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_TRAIN_PATH)]
    pub train_file: PathBuf,

    /// Test dataset used for evaluation
    #[arg(long, value_name = "FILE", default_value = DEFAULT_TEST_PATH)]
    pub test_file: PathBuf,

    /// Where the trained model artifact is written
    #[arg(long, value_name = "FILE", default_value = DEFAULT_MODEL_PATH)]
    pub model_file: PathBuf,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Training dataset (TSV with Title, Description, Area columns)
    #[arg(long, value_name = "FILE", default_value = DEFAULT_TRAIN_PATH)]
    pub train_file: PathBuf,

    /// Where the trained model artifact is written
    #[arg(long, value_name = "FILE", default_value = DEFAULT_MODEL_PATH)]
    pub model_file: PathBuf,
}

/// Arguments for evaluation
#[derive(Parser, Debug, Clone)]
pub struct EvaluateArgs {
    /// Saved model artifact
    #[arg(long, value_name = "FILE", default_value = DEFAULT_MODEL_PATH)]
    pub model_file: PathBuf,

    /// Test dataset used for evaluation
    #[arg(long, value_name = "FILE", default_value = DEFAULT_TEST_PATH)]
    pub test_file: PathBuf,
}

/// Arguments for single-issue prediction
#[derive(Parser, Debug, Clone)]
pub struct PredictArgs {
    /// Saved model artifact
    #[arg(long, value_name = "FILE", default_value = DEFAULT_MODEL_PATH)]
    pub model_file: PathBuf,

    /// Issue title
    #[arg(long)]
    pub title: String,

    /// Issue description
    #[arg(long, default_value = "")]
    pub description: String,

    /// Print the prediction as JSON with per-class probabilities
    #[arg(long)]
    pub json: bool,
}
