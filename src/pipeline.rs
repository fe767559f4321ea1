//! Discovery, extraction and schema in one call.

use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::catalog::{discover, FileCatalog};
use crate::config::ExtractionConfig;
use crate::error::PipelineError;
use crate::features::FeatureExtractor;
use crate::orchestrator::{CancellationToken, OrchestratorOptions, ParallelOrchestrator};
use crate::schema::ColumnSchema;
use crate::types::BatchOutcome;

/// Everything one extraction run produced.
#[derive(Debug)]
pub struct ExtractionRun {
    pub catalog: FileCatalog,
    pub schema: ColumnSchema,
    pub outcome: BatchOutcome,
}

impl ExtractionRun {
    pub fn succeeded_ids(&self) -> Vec<usize> {
        self.outcome.succeeded_ids()
    }
}

/// Extract features for every file under `root`.
///
/// Discovery failures and an invalid configuration end the run; files that
/// fail to decode or extract are reported in the outcome instead.
pub fn run_extraction(
    root: impl AsRef<Path>,
    config: &ExtractionConfig,
    options: OrchestratorOptions,
    token: CancellationToken,
) -> Result<ExtractionRun, PipelineError> {
    config
        .validate()
        .map_err(|err| PipelineError::Config(format!("{:#}", err)))?;

    let started = Instant::now();
    let catalog = discover(root)?;
    info!(
        root = %catalog.root().display(),
        files = catalog.len(),
        "discovered input files"
    );

    let orchestrator = ParallelOrchestrator::new(FeatureExtractor::new(config.clone()), options)
        .with_cancellation(token);
    let outcome = orchestrator.run(catalog.records())?;
    let schema = orchestrator.schema().clone();

    info!(
        rows = outcome.matrix.len(),
        columns = schema.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "extraction run complete"
    );

    Ok(ExtractionRun {
        catalog,
        schema,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiscoveryError;

    #[test]
    fn invalid_config_is_rejected_before_discovery() {
        let mut config = ExtractionConfig::default();
        config.n_fft = 0;
        let err = run_extraction(
            "/definitely/not/here",
            &config,
            OrchestratorOptions::with_workers(1),
            CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn missing_root_is_fatal() {
        let err = run_extraction(
            "/definitely/not/here",
            &ExtractionConfig::default(),
            OrchestratorOptions::with_workers(1),
            CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Discovery(DiscoveryError::NotFound(_))
        ));
    }

    #[test]
    fn empty_root_yields_empty_run() {
        let dir = tempfile::tempdir().unwrap();
        let run = run_extraction(
            dir.path(),
            &ExtractionConfig::default(),
            OrchestratorOptions::with_workers(2),
            CancellationToken::new(),
        )
        .unwrap();
        assert!(run.catalog.is_empty());
        assert!(run.succeeded_ids().is_empty());
        assert_eq!(run.schema.len(), 72);
    }
}
