//! `dqe` - DQE screenshot triage command line.
//!
//! `dqe mission` runs the diagnostic service (when enabled) and one triage
//! mission; `dqe validate` runs the batch validator and writes the workbook.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};

use dqe_triage::logging::{init_tracing, init_tracing_json, init_tracing_with_file};
use dqe_triage::triage::model::ClassifierLoader;
use dqe_triage::triage::{report, service, BatchValidator, TriageConfig, TriageRunner, WmicEnumerator};

/// Command-line arguments for dqe
#[derive(Parser, Debug)]
#[command(name = "dqe")]
#[command(about = "Triage DQE read/write screenshots against the drive under test")]
#[command(version)]
struct Args {
    /// Emit logs as JSON
    #[arg(long, global = true, env = "DQE_JSON_LOGS")]
    json_logs: bool,

    /// Also write logs to this file, rolled daily
    #[arg(long, global = true, env = "DQE_LOG_FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the diagnostic service and one mission
    Mission {
        /// Configuration file
        #[arg(short, long, default_value = "config.toml", env = "DQE_CONFIG")]
        config: PathBuf,
    },
    /// Validate a corpus and write the report workbook
    Validate {
        /// Configuration file
        #[arg(short, long, default_value = "validator.toml", env = "DQE_CONFIG")]
        config: PathBuf,
    },
}

#[cfg(feature = "onnx")]
fn classifier_loader() -> Box<dyn ClassifierLoader> {
    Box::new(dqe_triage::triage::onnx::OnnxLoader)
}

#[cfg(not(feature = "onnx"))]
fn classifier_loader() -> Box<dyn ClassifierLoader> {
    Box::new(dqe_triage::triage::model::UnavailableLoader)
}

fn load_config(path: &Path) -> Result<TriageConfig> {
    TriageConfig::from_file(path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))
}

fn run_mission(config: TriageConfig) -> Result<()> {
    info!("# DIAGNOSTIC");
    if let Err(e) = service::run_diagnostic(config.service.diagnostic.as_ref(), &config.input) {
        error!("Diagnostic service failed: {}", e);
        return Ok(());
    }

    info!("# INFER");
    let runner = TriageRunner::new(config, classifier_loader(), Box::new(WmicEnumerator));
    if let Some(outcome) = runner.run() {
        info!("Mission result: {}", outcome.result);
    }
    Ok(())
}

fn run_validate(config: TriageConfig) -> Result<()> {
    let loader = classifier_loader();
    let mut validator = BatchValidator::from_config(&config, loader.as_ref())
        .context("Failed to set up the validator")?;
    let batch = validator
        .run(&config.input.input_dir)
        .context("Batch validation failed")?;
    let path = report::save_report(&batch, &config.output.output_dir)
        .context("Failed to write the report")?;
    info!("Report: {}", path.display());
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = match &args.log_file {
        Some(path) => init_tracing_with_file(path, args.json_logs)
            .with_context(|| format!("Failed to open log file {}", path.display()))?,
        None => {
            if args.json_logs {
                init_tracing_json();
            } else {
                init_tracing();
            }
            None
        }
    };

    match args.command {
        Command::Mission { config } => run_mission(load_config(&config)?),
        Command::Validate { config } => run_validate(load_config(&config)?),
    }
}
