//! Declarative feature list shared by the extractor and the column schema.
//!
//! The extractor emits values by walking these lists and the schema emits
//! labels by walking the same lists, so adding or reordering a feature here
//! changes both sides at once.

use crate::config::ExtractionConfig;

/// Which roll-off threshold of [`crate::config::RolloffThresholds`] to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RolloffLevel {
    Primary,
    Upper,
    Lower,
}

/// A per-frame feature sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeatureKind {
    AmplitudeEnvelope,
    RootMeanSquareEnergy,
    ZeroCrossingRate,
    BandEnergyRatio,
    SpectralCentroid,
    SpectralBandwidth,
    SpectralContrast,
    SpectralFlatness,
    SpectralRolloff(RolloffLevel),
}

impl FeatureKind {
    pub fn label(self, config: &ExtractionConfig) -> String {
        let base = match self {
            FeatureKind::AmplitudeEnvelope => "amplitude_envelope",
            FeatureKind::RootMeanSquareEnergy => "root_mean_square_energy",
            FeatureKind::ZeroCrossingRate => "zero_crossing_rate",
            FeatureKind::BandEnergyRatio => "band_energy_ratio",
            FeatureKind::SpectralCentroid => "spectral_centroid",
            FeatureKind::SpectralBandwidth => "spectral_bandwidth",
            FeatureKind::SpectralContrast => "spectral_contrast",
            FeatureKind::SpectralFlatness => "spectral_flatness",
            FeatureKind::SpectralRolloff(level) => {
                return match level {
                    RolloffLevel::Primary => "spectral_rolloff".to_string(),
                    RolloffLevel::Upper => {
                        format!("spectral_rolloff_{}", percent_tag(config.rolloff.upper))
                    }
                    RolloffLevel::Lower => {
                        format!("spectral_rolloff_{}", percent_tag(config.rolloff.lower))
                    }
                }
            }
        };
        base.to_string()
    }
}

/// `0.99` -> `"99"`, `0.01` -> `"01"`.
fn percent_tag(fraction: f64) -> String {
    format!("{:02}", (fraction * 100.0).round() as u32)
}

/// Summary statistics applied to every aggregated feature, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Min,
    Max,
    Std,
}

impl Aggregation {
    pub fn suffix(self) -> &'static str {
        match self {
            Aggregation::Mean => "mean",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
            Aggregation::Std => "std",
        }
    }
}

pub const AGGREGATIONS: [Aggregation; 4] = [
    Aggregation::Mean,
    Aggregation::Min,
    Aggregation::Max,
    Aggregation::Std,
];

pub const AGGREGATED_FEATURES: [FeatureKind; 11] = [
    FeatureKind::AmplitudeEnvelope,
    FeatureKind::RootMeanSquareEnergy,
    FeatureKind::ZeroCrossingRate,
    FeatureKind::BandEnergyRatio,
    FeatureKind::SpectralCentroid,
    FeatureKind::SpectralBandwidth,
    FeatureKind::SpectralContrast,
    FeatureKind::SpectralFlatness,
    FeatureKind::SpectralRolloff(RolloffLevel::Primary),
    FeatureKind::SpectralRolloff(RolloffLevel::Upper),
    FeatureKind::SpectralRolloff(RolloffLevel::Lower),
];

pub const DISTRIBUTED_FEATURES: [FeatureKind; 3] = [
    FeatureKind::AmplitudeEnvelope,
    FeatureKind::RootMeanSquareEnergy,
    FeatureKind::ZeroCrossingRate,
];

/// Number of long windows the schema reserves for a distributed feature.
pub fn distributed_count(kind: FeatureKind, config: &ExtractionConfig) -> usize {
    match kind {
        FeatureKind::AmplitudeEnvelope => config.distributed.envelope_windows(),
        _ => config.distributed.framed_windows(),
    }
}

/// Label of the leading id column.
pub const ROW_INDEX_LABEL: &str = "row_index";
