//! Triage CLI binary.

use std::process;

use clap::Parser;
use tracing::Level;

use triage::cli::args::TriageArgs;
use triage::cli::commands::execute_command;

fn main() {
    // Parse command line arguments using clap
    let args = TriageArgs::parse();

    // Map verbosity onto the tracing level
    let level = match args.verbosity() {
        0 => Level::ERROR, // Quiet mode
        1 => Level::WARN,  // Default
        2 => Level::INFO,  // Verbose
        _ => Level::DEBUG, // Very verbose (3+)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    // Execute the command
    if let Err(e) = execute_command(args) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
