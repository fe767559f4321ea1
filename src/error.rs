//! Error taxonomy for discovery, decoding and extraction.

use std::path::PathBuf;

use symphonia::core::errors::Error as SymphoniaError;
use thiserror::Error;

/// Failure to enumerate the input corpus. Fatal to a run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("root path not found: {0}")]
    NotFound(PathBuf),

    #[error("root path is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot read directory {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to turn one file into a mono sample sequence.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to open audio file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported or unrecognized audio format in {path}: {source}")]
    Unsupported {
        path: PathBuf,
        #[source]
        source: SymphoniaError,
    },

    #[error("no audio track found in {0}")]
    NoAudioTrack(PathBuf),

    #[error("sample rate not specified in {0}")]
    MissingSampleRate(PathBuf),

    #[error("corrupt audio stream in {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: SymphoniaError,
    },

    #[error("audio file {0} decoded to zero samples")]
    Empty(PathBuf),
}

/// A feature vector whose width disagrees with the active column schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{section}: expected {expected} values, got {actual}")]
pub struct SchemaMismatchError {
    pub section: String,
    pub expected: usize,
    pub actual: usize,
}

impl SchemaMismatchError {
    pub fn new(section: impl Into<String>, expected: usize, actual: usize) -> Self {
        Self {
            section: section.into(),
            expected,
            actual,
        }
    }
}

/// Per-file failure. Recovered at the orchestrator boundary.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("schema mismatch: {0}")]
    SchemaMismatch(#[from] SchemaMismatchError),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("extraction panicked: {0}")]
    Panicked(String),
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("failed to build the feature worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

/// Run-level failure returned by [`crate::pipeline::run_extraction`].
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_converts_into_extraction_error() {
        let err: ExtractionError = DecodeError::Empty(PathBuf::from("a.wav")).into();
        assert!(matches!(err, ExtractionError::Decode(DecodeError::Empty(_))));
        assert!(err.to_string().contains("a.wav"));
    }

    #[test]
    fn schema_mismatch_message_names_section() {
        let err = SchemaMismatchError::new("zero_crossing_rate windows", 11, 9);
        assert_eq!(
            err.to_string(),
            "zero_crossing_rate windows: expected 11 values, got 9"
        );
    }
}
