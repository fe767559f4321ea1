//! Column labels for feature vectors.

use serde::Serialize;

use crate::config::ExtractionConfig;
use crate::error::SchemaMismatchError;
use crate::features::registry::{
    distributed_count, AGGREGATED_FEATURES, AGGREGATIONS, DISTRIBUTED_FEATURES, ROW_INDEX_LABEL,
};

/// Ordered column names, one per value of a feature vector built with the
/// same configuration. Never looks at a signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ColumnSchema {
    labels: Vec<String>,
}

impl ColumnSchema {
    pub fn for_config(config: &ExtractionConfig) -> Self {
        let mut labels = vec![ROW_INDEX_LABEL.to_string()];

        for kind in AGGREGATED_FEATURES {
            let base = kind.label(config);
            labels.extend(
                AGGREGATIONS
                    .iter()
                    .map(|aggregation| format!("{}_{}", base, aggregation.suffix())),
            );
        }

        for kind in DISTRIBUTED_FEATURES {
            let base = kind.label(config);
            let count = distributed_count(kind, config);
            labels.extend((0..count).map(|i| format!("{}_f{}", base, i)));
        }

        Self { labels }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn position(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|candidate| candidate == label)
    }

    /// Ensure a vector has exactly one value per column.
    pub fn check(&self, vector: &[f64]) -> Result<(), SchemaMismatchError> {
        if vector.len() == self.labels.len() {
            Ok(())
        } else {
            Err(SchemaMismatchError::new(
                "feature vector",
                self.labels.len(),
                vector.len(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistributedSettings;
    use std::collections::HashSet;

    #[test]
    fn default_schema_layout() {
        let schema = ColumnSchema::for_config(&ExtractionConfig::default());
        let labels = schema.labels();
        assert_eq!(labels.len(), 72);
        assert_eq!(labels[0], "row_index");
        assert_eq!(labels[1], "amplitude_envelope_mean");
        assert_eq!(labels[4], "amplitude_envelope_std");
        assert_eq!(labels[44], "spectral_rolloff_01_std");
        assert_eq!(labels[45], "amplitude_envelope_f0");
        assert_eq!(labels[49], "amplitude_envelope_f4");
        assert_eq!(labels[50], "root_mean_square_energy_f0");
        assert_eq!(labels[71], "zero_crossing_rate_f10");
    }

    #[test]
    fn labels_are_unique() {
        let schema = ColumnSchema::for_config(&ExtractionConfig::default());
        let unique: HashSet<&String> = schema.labels().iter().collect();
        assert_eq!(unique.len(), schema.len());
    }

    #[test]
    fn clip_duration_changes_distributed_columns() {
        let config = ExtractionConfig {
            distributed: DistributedSettings {
                clip_seconds: 4,
                ..DistributedSettings::default()
            },
            ..ExtractionConfig::default()
        };
        let schema = ColumnSchema::for_config(&config);
        assert_eq!(schema.len(), 1 + 44 + 2 + 5 + 5);
        assert!(schema.position("zero_crossing_rate_f4").is_some());
        assert!(schema.position("zero_crossing_rate_f5").is_none());
    }

    #[test]
    fn check_reports_width_difference() {
        let schema = ColumnSchema::for_config(&ExtractionConfig::default());
        assert!(schema.check(&vec![0.0; 72]).is_ok());
        let err = schema.check(&[0.0; 3]).unwrap_err();
        assert_eq!((err.expected, err.actual), (72, 3));
    }
}
