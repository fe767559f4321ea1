use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;

use acoustic_featurizer::dataset::{DatasetAssembler, FeatureRow, LabeledTableAssembler};
use acoustic_featurizer::{
    load_config, run_extraction, CancellationToken, DurationPolicy, ExtractionRun,
    OrchestratorOptions,
};
use anyhow::{ensure, Context, Result};
use clap::Parser;
use serde::Serialize;
use tokio::signal;
use tracing::{info, warn};

/// Acoustic featurizer - fixed-width feature tables from audio folders
///
/// Walks a directory of recordings, extracts time and frequency domain
/// statistics for every file in parallel and writes one JSON table.
#[derive(Parser, Debug)]
#[command(name = "acoustic-featurizer")]
#[command(version = "0.1.0")]
#[command(about = "Extract audio feature tables from a directory tree", long_about = None)]
struct Args {
    /// Root directory holding the recordings
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Path to a JSON extraction config
    #[arg(long, value_name = "PATH", conflicts_with = "config_json")]
    config: Option<PathBuf>,

    /// Inline JSON extraction config
    #[arg(long, value_name = "JSON", conflicts_with = "config")]
    config_json: Option<String>,

    /// Worker threads (defaults to available parallelism)
    #[arg(long, value_name = "N")]
    workers: Option<usize>,

    /// Write the JSON report here instead of stdout
    #[arg(long, short, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Truncate or NaN-pad long-window features instead of rejecting clips
    /// whose duration differs from the configured clip length
    #[arg(long)]
    fit_duration: bool,
}

impl Args {
    fn validate(&self) -> Result<()> {
        ensure!(
            self.root.is_dir(),
            "Root directory does not exist: {:?}",
            self.root
        );
        if let Some(workers) = self.workers {
            ensure!(workers > 0, "Worker count must be positive");
        }
        Ok(())
    }

    fn orchestrator_options(&self) -> OrchestratorOptions {
        match self.workers {
            Some(workers) => OrchestratorOptions::with_workers(workers),
            None => OrchestratorOptions::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct FailureReport {
    id: usize,
    path: PathBuf,
    error: String,
}

#[derive(Debug, Serialize)]
struct Report {
    columns: Vec<String>,
    rows: Vec<FeatureRow>,
    failures: Vec<FailureReport>,
    skipped: Vec<usize>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    args.validate()
        .context("Failed to validate command-line arguments")?;

    let mut config = load_config(args.config.as_deref(), args.config_json.as_deref())
        .context("Failed to load extraction config")?;
    if args.fit_duration {
        config = config.with_policy(DurationPolicy::Fit);
    }

    // Ctrl+C stops handing out files; finished rows are still reported
    let token = CancellationToken::new();
    install_interrupt_handler(token.clone())?;

    let run = run_extraction(&args.root, &config, args.orchestrator_options(), token)
        .with_context(|| format!("Feature extraction failed for {:?}", args.root))?;

    let report = build_report(&run)?;
    let json = serde_json::to_string_pretty(&report).context("Failed to serialize report")?;

    match &args.output {
        Some(path) => {
            fs::write(path, json).with_context(|| format!("Failed to write report {:?}", path))?;
            info!(path = %path.display(), "wrote report");
        }
        None => {
            let mut stdout = io::stdout().lock();
            writeln!(stdout, "{}", json).context("Failed to write report to stdout")?;
        }
    }

    if run.outcome.cancelled {
        warn!(
            skipped = report.skipped.len(),
            "extraction interrupted before every file was processed"
        );
    }
    if !report.failures.is_empty() {
        warn!(
            failed = report.failures.len(),
            "some files could not be processed"
        );
    }
    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Cancel `token` on Ctrl+C. The listener thread lives until the process exits.
fn install_interrupt_handler(token: CancellationToken) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start the interrupt listener runtime")?;

    thread::Builder::new()
        .name("interrupt-listener".to_string())
        .spawn(move || {
            runtime.block_on(async {
                match signal::ctrl_c().await {
                    Ok(()) => {
                        warn!("Received Ctrl+C, cancelling extraction");
                        token.cancel();
                    }
                    Err(err) => warn!(error = %err, "Failed to listen for Ctrl+C"),
                }
            });
        })
        .context("Failed to spawn the interrupt listener")?;
    Ok(())
}

fn build_report(run: &ExtractionRun) -> Result<Report> {
    let table = LabeledTableAssembler
        .assemble(&run.catalog, &run.schema, &run.outcome.matrix)
        .context("Failed to assemble feature table")?;
    let failures = run
        .outcome
        .failures
        .iter()
        .map(|failure| FailureReport {
            id: failure.id,
            path: failure.path.clone(),
            error: failure.error.to_string(),
        })
        .collect();

    Ok(Report {
        columns: table.columns,
        rows: table.rows,
        failures,
        skipped: run.outcome.skipped.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_sources_are_exclusive() {
        let parsed = Args::try_parse_from([
            "acoustic-featurizer",
            "data",
            "--config",
            "a.json",
            "--config-json",
            "{}",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn worker_override_sets_pool_size() {
        let args =
            Args::try_parse_from(["acoustic-featurizer", "data", "--workers", "3"]).unwrap();
        assert_eq!(args.orchestrator_options().workers, 3);

        let args = Args::try_parse_from(["acoustic-featurizer", "data"]).unwrap();
        assert!(args.orchestrator_options().workers >= 1);
    }

    #[test]
    fn interrupt_handler_installs_without_signal() {
        let token = CancellationToken::new();
        install_interrupt_handler(token.clone()).unwrap();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn zero_workers_fail_validation() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let args = Args::try_parse_from(["acoustic-featurizer", root, "--workers", "0"]).unwrap();
        assert!(args.validate().is_err());
    }
}
