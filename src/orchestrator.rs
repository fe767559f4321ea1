//! Parallel batch extraction
//!
//! Records are mapped to vectors on a dedicated rayon pool. Failures and
//! panics are captured per file; the matrix is keyed by id, so completion
//! order does not matter.

use std::any::Any;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, OrchestratorError};
use crate::features::FeatureExtractor;
use crate::schema::ColumnSchema;
use crate::types::{BatchOutcome, FailedFile, FeatureVector, FileRecord};

/// Shared flag that stops a running batch.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorOptions {
    pub workers: usize,
}

impl Default for OrchestratorOptions {
    fn default() -> Self {
        let workers = thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self::with_workers(workers)
    }
}

impl OrchestratorOptions {
    pub fn with_workers(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

type TaskResult = (usize, Result<FeatureVector, ExtractionError>);

pub struct ParallelOrchestrator {
    extractor: FeatureExtractor,
    schema: ColumnSchema,
    options: OrchestratorOptions,
    cancel: CancellationToken,
}

impl ParallelOrchestrator {
    pub fn new(extractor: FeatureExtractor, options: OrchestratorOptions) -> Self {
        let schema = ColumnSchema::for_config(extractor.config());
        Self {
            extractor,
            schema,
            options,
            cancel: CancellationToken::new(),
        }
    }

    /// Use an externally owned token, e.g. one wired to an interrupt handler.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn options(&self) -> OrchestratorOptions {
        self.options
    }

    /// Extract every record on a pool of `options.workers` threads. Returns
    /// once every started file has finished.
    pub fn run(&self, records: &[FileRecord]) -> Result<BatchOutcome, OrchestratorError> {
        // No more threads than files
        let workers = self.options.workers.max(1).min(records.len().max(1));
        info!(files = records.len(), workers, "starting feature extraction");

        // Build a pool private to this batch
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|index| format!("feature-worker-{}", index))
            .build()?;

        // Workers pull records straight from the borrowed slice; once the
        // token is set the remaining records are left out of the results
        let results: Vec<TaskResult> = pool.install(|| {
            records
                .par_iter()
                .filter_map(|record| {
                    if self.cancel.is_cancelled() {
                        return None;
                    }
                    Some((record.id, self.process(record)))
                })
                .collect()
        });

        Ok(self.assemble(records, results))
    }

    /// Same per-file semantics as [`run`](Self::run) on the calling thread.
    pub fn run_sequential(&self, records: &[FileRecord]) -> BatchOutcome {
        let mut results = Vec::with_capacity(records.len());
        for record in records {
            if self.cancel.is_cancelled() {
                break;
            }
            results.push((record.id, self.process(record)));
        }
        self.assemble(records, results)
    }

    fn process(&self, record: &FileRecord) -> Result<FeatureVector, ExtractionError> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.extractor.extract(record)))
            .unwrap_or_else(|payload| Err(ExtractionError::Panicked(panic_message(payload))));
        let vector = outcome?;
        self.schema.check(&vector)?;
        debug!(id = record.id, path = %record.path.display(), "extracted features");
        Ok(vector)
    }

    fn assemble(&self, records: &[FileRecord], results: Vec<TaskResult>) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            cancelled: self.cancel.is_cancelled(),
            ..BatchOutcome::default()
        };
        let positions: HashMap<usize, usize> = records
            .iter()
            .enumerate()
            .map(|(position, record)| (record.id, position))
            .collect();
        // Anything never returned by a worker was skipped
        let mut seen = vec![false; records.len()];

        for (id, result) in results {
            let position = positions.get(&id).copied();
            if let Some(position) = position {
                seen[position] = true;
            }
            match result {
                Ok(vector) => {
                    outcome.matrix.insert(id, vector);
                }
                Err(error) => {
                    let path = position
                        .map(|position| records[position].path.clone())
                        .unwrap_or_default();
                    warn!(id, path = %path.display(), %error, "feature extraction failed");
                    outcome.failures.push(FailedFile { id, path, error });
                }
            }
        }

        outcome.failures.sort_by_key(|failure| failure.id);
        outcome.skipped = records
            .iter()
            .zip(&seen)
            .filter(|(_, done)| !**done)
            .map(|(record, _)| record.id)
            .collect();
        outcome.skipped.sort_unstable();

        info!(
            succeeded = outcome.matrix.len(),
            failed = outcome.failures.len(),
            skipped = outcome.skipped.len(),
            cancelled = outcome.cancelled,
            "feature extraction finished"
        );
        outcome
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
