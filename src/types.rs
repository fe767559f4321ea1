//! Core types for the feature extraction pipeline

use std::collections::BTreeMap;
use std::path::PathBuf;

use ndarray::Array2;
use serde::Serialize;

use crate::error::{ExtractionError, SchemaMismatchError};

/// One discovered input file and its row identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub id: usize,
    pub path: PathBuf,
}

impl FileRecord {
    pub fn new(id: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            id,
            path: path.into(),
        }
    }
}

/// Decoded mono audio at its native sample rate
#[derive(Debug, Clone)]
pub struct Signal {
    /// Audio samples, normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz (e.g., 16000)
    pub sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// `[row_index, <aggregated features>, <distributed features>]`
pub type FeatureVector = Vec<f64>;

/// Feature vectors keyed by file id, always iterated in ascending id order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: BTreeMap<usize, FeatureVector>,
}

impl FeatureMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: usize, vector: FeatureVector) -> Option<FeatureVector> {
        self.rows.insert(id, vector)
    }

    pub fn get(&self, id: usize) -> Option<&FeatureVector> {
        self.rows.get(&id)
    }

    pub fn contains(&self, id: usize) -> bool {
        self.rows.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn ids(&self) -> Vec<usize> {
        self.rows.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &FeatureVector)> {
        self.rows.iter().map(|(id, row)| (*id, row))
    }

    /// Dense `rows × width` matrix in id order.
    pub fn to_array(&self, width: usize) -> Result<Array2<f64>, SchemaMismatchError> {
        let mut flat = Vec::with_capacity(self.rows.len() * width);
        for (id, row) in &self.rows {
            if row.len() != width {
                return Err(SchemaMismatchError::new(
                    format!("matrix row {}", id),
                    width,
                    row.len(),
                ));
            }
            flat.extend_from_slice(row);
        }
        Array2::from_shape_vec((self.rows.len(), width), flat)
            .map_err(|_| SchemaMismatchError::new("matrix shape", width, 0))
    }
}

/// A file that could not be turned into a feature vector
#[derive(Debug)]
pub struct FailedFile {
    pub id: usize,
    pub path: PathBuf,
    pub error: ExtractionError,
}

/// Everything a batch produced: successful rows, failures and unprocessed ids
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub matrix: FeatureMatrix,
    pub failures: Vec<FailedFile>,
    /// Ids never processed because the batch was cancelled
    pub skipped: Vec<usize>,
    pub cancelled: bool,
}

impl BatchOutcome {
    pub fn succeeded_ids(&self) -> Vec<usize> {
        self.matrix.ids()
    }

    pub fn failed_ids(&self) -> Vec<usize> {
        self.failures.iter().map(|failure| failure.id).collect()
    }
}
