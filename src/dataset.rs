//! Joining the feature matrix with folder-derived labels.
//!
//! Recordings are expected under
//! `.../<snr>_dB_<...>/<machine_type>/<machine_id>/<normal|abnormal>/<file>`.
//! Files outside that layout still get a row, just without metadata.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::catalog::FileCatalog;
use crate::error::SchemaMismatchError;
use crate::schema::ColumnSchema;
use crate::types::FeatureMatrix;

/// Labels recovered from the directories above a recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SampleMetadata {
    pub snr: String,
    pub machine_type: String,
    pub machine_id: String,
    pub is_defect: bool,
}

impl SampleMetadata {
    pub fn from_path(path: &Path) -> Option<Self> {
        let folders: Vec<&str> = path
            .parent()?
            .iter()
            .filter_map(|component| component.to_str())
            .collect();
        let [.., snr_folder, machine_type, machine_id, condition] = folders.as_slice() else {
            return None;
        };

        let is_defect = match *condition {
            "abnormal" => true,
            "normal" => false,
            _ => return None,
        };
        let snr = snr_folder
            .split_once("_dB_")
            .map_or(*snr_folder, |(snr, _)| snr)
            .to_string();

        Some(Self {
            snr,
            machine_type: capitalize(machine_type),
            machine_id: machine_id.to_string(),
            is_defect,
        })
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Turns a finished matrix into whatever tabular shape a consumer needs.
pub trait DatasetAssembler {
    type Output;

    fn assemble(
        &self,
        catalog: &FileCatalog,
        schema: &ColumnSchema,
        matrix: &FeatureMatrix,
    ) -> Result<Self::Output, SchemaMismatchError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureRow {
    pub id: usize,
    pub path: Option<PathBuf>,
    pub metadata: Option<SampleMetadata>,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureTable {
    pub columns: Vec<String>,
    pub rows: Vec<FeatureRow>,
}

/// Default assembler: one row per extracted file, in id order, labelled from
/// its folders.
#[derive(Debug, Clone, Copy, Default)]
pub struct LabeledTableAssembler;

impl DatasetAssembler for LabeledTableAssembler {
    type Output = FeatureTable;

    fn assemble(
        &self,
        catalog: &FileCatalog,
        schema: &ColumnSchema,
        matrix: &FeatureMatrix,
    ) -> Result<FeatureTable, SchemaMismatchError> {
        let mut rows = Vec::with_capacity(matrix.len());
        for (id, values) in matrix.iter() {
            if values.len() != schema.len() {
                return Err(SchemaMismatchError::new(
                    format!("row {}", id),
                    schema.len(),
                    values.len(),
                ));
            }
            let path = catalog.get(id).map(|record| record.path.clone());
            let metadata = path.as_deref().and_then(SampleMetadata::from_path);
            rows.push(FeatureRow {
                id,
                path,
                metadata,
                values: values.clone(),
            });
        }

        Ok(FeatureTable {
            columns: schema.labels().to_vec(),
            rows,
        })
    }
}
