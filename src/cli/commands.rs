//! Command implementations for the triage CLI.

use std::time::Instant;

use crate::cli::args::*;
use crate::dataset::loader::TextLoader;
use crate::error::Result;
use crate::evaluate;
use crate::issue::{self, IssueRecord};
use crate::model::{SavedModel, load_model, save_model};
use crate::predict::PredictionEngine;

/// Execute a CLI command.
pub fn execute_command(args: TriageArgs) -> Result<()> {
    match &args.command {
        Command::Run(run_args) => run_scenario(run_args.clone(), &args),
        Command::Train(train_args) => train_model(train_args.clone(), &args),
        Command::Evaluate(eval_args) => evaluate_model(eval_args.clone(), &args),
        Command::Predict(predict_args) => predict_issue(predict_args.clone(), &args),
    }
}

/// The full pass: train, sanity-predict, evaluate, save, reload, predict.
fn run_scenario(args: RunArgs, cli_args: &TriageArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Loading training data from: {}", args.train_file.display());
    }

    let schema = issue::issue_schema();
    let loader = TextLoader::new(schema.clone()).with_header(true);
    let train_view = loader.load(&args.train_file)?;

    let start = Instant::now();
    let trained = issue::triage_pipeline().fit(&train_view)?;
    if cli_args.verbosity() > 1 {
        println!(
            "Trained on {} issues in {:.2?}",
            train_view.num_rows(),
            start.elapsed()
        );
    }

    // Sanity prediction straight off the just-trained pipeline.
    let engine = PredictionEngine::new(trained.clone(), &schema)?;
    let sample = IssueRecord::new(
        "WebSockets communication is slow in my machine",
        "The WebSocket communication used under my web sample application has \
         a very slow latency and low throughput.",
    );
    let prediction = engine.predict(&sample)?;
    println!(
        "=============== Single Prediction just-trained-model - Result: {} ===============",
        prediction.area
    );

    let metrics = evaluate::evaluate(&trained, &schema, &args.test_file)?;
    println!("{metrics}");
    if cli_args.verbosity() > 1 {
        print_per_class_log_loss(&metrics);
    }

    let saved = SavedModel::new(trained, schema, train_view.num_rows());
    save_model(&saved, &args.model_file)?;
    if cli_args.verbosity() > 0 {
        println!("Model saved to: {}", args.model_file.display());
    }

    // Reload from disk and predict with the restored pipeline.
    let restored = load_model(&args.model_file)?;
    let engine = PredictionEngine::new(restored.pipeline, &restored.schema)?;
    let record = IssueRecord::new(
        "Entity Framework crashes",
        "When connecting to the database, EF is crashing",
    );
    let prediction = engine.predict(&record)?;
    println!(
        "=============== Single Prediction - Result: {} ===============",
        prediction.area
    );

    Ok(())
}

/// Train a model and save the artifact.
fn train_model(args: TrainArgs, cli_args: &TriageArgs) -> Result<()> {
    if cli_args.verbosity() > 0 {
        println!("Loading training data from: {}", args.train_file.display());
    }

    let schema = issue::issue_schema();
    let loader = TextLoader::new(schema.clone()).with_header(true);
    let view = loader.load(&args.train_file)?;

    let start = Instant::now();
    let trained = issue::triage_pipeline().fit(&view)?;

    if cli_args.verbosity() > 0 {
        if let Some(model) = trained.classifier() {
            println!(
                "Trained {} classes over {} features in {:.2?}",
                model.classes().len(),
                model.dimension(),
                start.elapsed()
            );
        }
    }

    let saved = SavedModel::new(trained, schema, view.num_rows());
    save_model(&saved, &args.model_file)?;
    println!("Model saved to: {}", args.model_file.display());

    Ok(())
}

/// Evaluate a saved model against a test dataset.
fn evaluate_model(args: EvaluateArgs, cli_args: &TriageArgs) -> Result<()> {
    let saved = load_model(&args.model_file)?;
    if cli_args.verbosity() > 0 {
        println!("Evaluating model against: {}", args.test_file.display());
    }

    let metrics = evaluate::evaluate(&saved.pipeline, &saved.schema, &args.test_file)?;
    println!("{metrics}");
    if cli_args.verbosity() > 1 {
        print_per_class_log_loss(&metrics);
    }

    Ok(())
}

fn print_per_class_log_loss(metrics: &evaluate::MulticlassMetrics) {
    for entry in &metrics.per_class_log_loss {
        println!(
            "  {}: log-loss {:.3} over {} rows",
            entry.class, entry.log_loss, entry.support
        );
    }
}

/// Predict the area of a single issue with a saved model.
fn predict_issue(args: PredictArgs, _cli_args: &TriageArgs) -> Result<()> {
    let saved = load_model(&args.model_file)?;
    let engine = PredictionEngine::new(saved.pipeline, &saved.schema)?;

    let record = IssueRecord::new(args.title.clone(), args.description.clone());
    let prediction = engine.predict(&record)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&prediction)?);
    } else {
        println!("Predicted area: {}", prediction.area);
    }

    Ok(())
}
