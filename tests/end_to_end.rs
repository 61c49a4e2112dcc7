use std::fs;

use triage::cli::args::{Command, RunArgs, TriageArgs};
use triage::cli::commands::execute_command;
use triage::dataset::loader::TextLoader;
use triage::dataset::schema::Schema;
use triage::error::Result;
use triage::evaluate::evaluate;
use triage::issue::{self, IssueRecord};
use triage::model::{SavedModel, load_model, save_model};
use triage::pipeline::TrainedPipeline;
use triage::predict::PredictionEngine;

#[test]
fn test_shipped_datasets_train_and_predict() -> Result<()> {
    let (trained, schema, rows) = train_on_shipped_data()?;
    assert_eq!(rows, 48);

    let engine = PredictionEngine::new(trained, &schema)?;
    assert_eq!(
        engine.classes(),
        &[
            "area-System.Net".to_string(),
            "area-System.Data".to_string(),
            "area-System.IO".to_string(),
            "area-Infrastructure".to_string(),
        ]
    );

    // A networking issue phrased nothing like any single training row.
    let web = IssueRecord::new(
        "WebSockets communication is slow in my machine",
        "The WebSocket communication used under my web sample application has \
         a very slow latency and low throughput.",
    );
    assert_eq!(engine.predict(&web)?.area, "area-System.Net");

    // And a database issue.
    let data = IssueRecord::new(
        "Entity Framework crashes",
        "When connecting to the database, EF is crashing",
    );
    assert_eq!(engine.predict(&data)?.area, "area-System.Data");

    Ok(())
}

#[test]
fn test_metrics_on_shipped_test_data() -> Result<()> {
    let (trained, schema, _) = train_on_shipped_data()?;

    let metrics = evaluate(&trained, &schema, "data/issues_test.tsv")?;

    assert!(
        metrics.micro_accuracy >= 0.75,
        "micro accuracy too low: {}",
        metrics.micro_accuracy
    );
    assert!(
        metrics.macro_accuracy >= 0.75,
        "macro accuracy too low: {}",
        metrics.macro_accuracy
    );
    assert!(metrics.log_loss.is_finite() && metrics.log_loss > 0.0);
    assert!(
        metrics.log_loss_reduction > 0.0,
        "model should beat the prior: {}",
        metrics.log_loss_reduction
    );
    assert_eq!(metrics.per_class_log_loss.len(), 4);

    Ok(())
}

#[test]
fn test_training_is_deterministic() -> Result<()> {
    // Two independent fits over the same data must agree bit for bit.
    let (first, schema, _) = train_on_shipped_data()?;
    let (second, _, _) = train_on_shipped_data()?;

    let a = evaluate(&first, &schema, "data/issues_test.tsv")?;
    let b = evaluate(&second, &schema, "data/issues_test.tsv")?;

    assert_eq!(a.micro_accuracy.to_bits(), b.micro_accuracy.to_bits());
    assert_eq!(a.macro_accuracy.to_bits(), b.macro_accuracy.to_bits());
    assert_eq!(a.log_loss.to_bits(), b.log_loss.to_bits());
    assert_eq!(
        a.log_loss_reduction.to_bits(),
        b.log_loss_reduction.to_bits()
    );

    Ok(())
}

#[test]
fn test_save_load_predicts_identically() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("issue_model.bin");
    let (trained, schema, rows) = train_on_shipped_data()?;

    let saved = SavedModel::new(trained.clone(), schema.clone(), rows);
    save_model(&saved, &path)?;
    let restored = load_model(&path)?;

    let engine_a = PredictionEngine::new(trained, &schema)?;
    let engine_b = PredictionEngine::new(restored.pipeline, &restored.schema)?;

    let record = IssueRecord::new(
        "Socket timeout on slow network",
        "The socket read times out under high latency.",
    );
    let a = engine_a.predict(&record)?;
    let b = engine_b.predict(&record)?;

    assert_eq!(a.area, b.area);
    assert_eq!(a.scores, b.scores);

    Ok(())
}

#[test]
fn test_evaluation_handles_unseen_labels() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let test_path = dir.path().join("unseen.tsv");
    fs::write(
        &test_path,
        "Title\tDescription\tArea\n\
         WebSockets drop frames\tThe websocket stream stalls under load.\tarea-System.Net\n\
         Dark mode broken\tThe settings page renders wrong colors.\tarea-UnknownArea\n",
    )?;

    let (trained, schema, _) = train_on_shipped_data()?;
    let metrics = evaluate(&trained, &schema, &test_path)?;

    // The unseen label can never be predicted, and the model assigns its
    // row probability zero, which the log-loss clamp turns into a heavy
    // but finite penalty.
    assert!(metrics.micro_accuracy <= 0.5);
    assert!(metrics.log_loss > 15.0);
    assert!(metrics.log_loss.is_finite());

    Ok(())
}

#[test]
fn test_keyword_corpus_ranks_true_label_highest() -> Result<()> {
    // A tiny corpus whose two labels are separated by disjoint keywords.
    let dir = tempfile::tempdir()?;
    let train_path = dir.path().join("keywords.tsv");
    fs::write(
        &train_path,
        "Title\tDescription\tArea\n\
         EF crash on save\tSaving changes makes EF crash against the database.\tEF Issues\n\
         WebSockets disconnect randomly\tThe SignalR connection over WebSockets drops every few minutes.\tWeb Issues\n\
         Database migration never finishes\tThe EF migration runs for hours against a large database.\tEF Issues\n\
         SignalR reconnect storm\tClients reconnect in a loop once the WebSockets transport stalls.\tWeb Issues\n\
         Database provider crashes\tOpening the database connection crashes the provider process.\tEF Issues\n\
         WebSockets handshake rejected\tThe SignalR negotiation fails before the WebSockets upgrade completes.\tWeb Issues\n\
         EF query translation crash\tTranslating the query crashes EF before it reaches the database.\tEF Issues\n\
         SignalR latency spikes\tMessages over WebSockets arrive seconds late under SignalR load.\tWeb Issues\n",
    )?;

    let schema = issue::issue_schema();
    let view = TextLoader::new(schema.clone())
        .with_header(true)
        .load(&train_path)?;
    let trained = issue::triage_pipeline().fit(&view)?;
    let engine = PredictionEngine::new(trained, &schema)?;

    let record = IssueRecord::new(
        "Entity Framework crashes",
        "When connecting to the database, EF is crashing",
    );
    let prediction = engine.predict(&record)?;
    assert_eq!(prediction.area, "EF Issues");

    let winner = engine
        .classes()
        .iter()
        .position(|class| class == "EF Issues")
        .unwrap();
    for (index, &score) in prediction.scores.iter().enumerate() {
        if index != winner {
            assert!(prediction.scores[winner] > score);
        }
    }

    Ok(())
}

#[test]
fn test_run_command_full_scenario() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let model_path = dir.path().join("model").join("issue_model.bin");

    let args = TriageArgs {
        verbose: 0,
        quiet: true,
        command: Command::Run(RunArgs {
            train_file: "data/issues_train.tsv".into(),
            test_file: "data/issues_test.tsv".into(),
            model_file: model_path.clone(),
        }),
    };
    execute_command(args)?;

    // The scenario trains, evaluates, and leaves a loadable artifact behind.
    assert!(model_path.exists());
    let saved = load_model(&model_path)?;
    assert_eq!(saved.metadata.training_rows, 48);
    assert_eq!(saved.metadata.num_classes, 4);
    assert_eq!(saved.schema, issue::issue_schema());

    Ok(())
}

#[test]
fn test_missing_training_file_errors() {
    let loader = TextLoader::new(issue::issue_schema()).with_header(true);
    let err = loader.load("data/no_such_file.tsv").unwrap_err();
    assert!(err.to_string().contains("cannot open dataset file"));
}

fn train_on_shipped_data() -> Result<(TrainedPipeline, Schema, usize)> {
    let schema = issue::issue_schema();
    let loader = TextLoader::new(schema.clone()).with_header(true);
    let view = loader.load("data/issues_train.tsv")?;
    let rows = view.num_rows();
    let trained = issue::triage_pipeline().fit(&view)?;
    Ok((trained, schema, rows))
}
