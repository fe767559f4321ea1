//! Acoustic feature extraction
//!
//! Turns a directory tree of recordings into a fixed-width numeric table:
//! files are discovered, decoded to mono, reduced to a deterministic feature
//! vector each on a worker pool, and labelled by a column schema derived from
//! the same configuration.

pub mod audio;
pub mod catalog;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod orchestrator;
pub mod pipeline;
pub mod schema;
pub mod types;

pub use catalog::{discover, FileCatalog};
pub use config::{load_config, DurationPolicy, ExtractionConfig};
pub use dataset::{DatasetAssembler, FeatureTable, LabeledTableAssembler, SampleMetadata};
pub use error::{
    DecodeError, DiscoveryError, ExtractionError, OrchestratorError, PipelineError,
    SchemaMismatchError,
};
pub use features::FeatureExtractor;
pub use orchestrator::{CancellationToken, OrchestratorOptions, ParallelOrchestrator};
pub use pipeline::{run_extraction, ExtractionRun};
pub use schema::ColumnSchema;
pub use types::{BatchOutcome, FailedFile, FeatureMatrix, FeatureVector, FileRecord, Signal};
