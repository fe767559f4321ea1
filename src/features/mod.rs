pub mod registry;
pub mod spectral;
pub mod spectrum;
pub mod statistics;
pub mod time_domain;

use registry::{
    distributed_count, FeatureKind, RolloffLevel, AGGREGATED_FEATURES, AGGREGATIONS,
    DISTRIBUTED_FEATURES,
};
use spectrum::Spectrum;
use statistics::aggregate;

use crate::audio;
use crate::config::{DistributedSettings, DurationPolicy, ExtractionConfig};
use crate::error::{ExtractionError, SchemaMismatchError};
use crate::types::{FeatureVector, FileRecord, Signal};

/// Turns one audio file into a fixed-order feature vector.
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractionConfig,
}

impl FeatureExtractor {
    /// `config` is expected to have passed [`ExtractionConfig::validate`].
    pub fn new(config: ExtractionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Width of every vector this extractor produces.
    pub fn vector_len(&self) -> usize {
        let aggregated = AGGREGATED_FEATURES.len() * AGGREGATIONS.len();
        let distributed: usize = DISTRIBUTED_FEATURES
            .iter()
            .map(|&kind| distributed_count(kind, &self.config))
            .sum();
        1 + aggregated + distributed
    }

    pub fn extract(&self, record: &FileRecord) -> Result<FeatureVector, ExtractionError> {
        let signal = audio::load(&record.path)?;
        self.extract_signal(record.id, &signal)
    }

    pub fn extract_signal(
        &self,
        id: usize,
        signal: &Signal,
    ) -> Result<FeatureVector, ExtractionError> {
        if signal.sample_rate == 0 {
            return Err(ExtractionError::InvalidParameter(
                "signal has a sample rate of 0 Hz".to_string(),
            ));
        }

        // centred long windows only match the reserved count for even lengths
        let long_window = self.config.distributed.window_seconds;
        let window = long_window as usize * signal.sample_rate as usize;
        if window % 2 == 1 {
            return Err(ExtractionError::InvalidParameter(format!(
                "long window of {} s at {} Hz spans an odd {} samples",
                long_window, signal.sample_rate, window
            )));
        }

        let frames = FrameFeatures::compute(signal, &self.config)?;
        let distributed = DistributedFeatures::compute(signal, &self.config.distributed);

        let mut vector = Vec::with_capacity(self.vector_len());
        vector.push(id as f64);

        for kind in AGGREGATED_FEATURES {
            vector.extend(aggregate(frames.sequence(kind)));
        }

        for kind in DISTRIBUTED_FEATURES {
            let expected = distributed_count(kind, &self.config);
            let windows = distributed.windows(kind);
            if windows.len() != expected {
                let mismatch = SchemaMismatchError::new(
                    format!("{} windows", kind.label(&self.config)),
                    expected,
                    windows.len(),
                );
                match self.config.distributed.policy {
                    DurationPolicy::Strict => return Err(mismatch.into()),
                    DurationPolicy::Fit => {
                        tracing::debug!(id, %mismatch, "fitting long windows to schema");
                    }
                }
            }
            vector.extend(
                windows
                    .iter()
                    .copied()
                    .chain(std::iter::repeat(f64::NAN))
                    .take(expected),
            );
        }

        Ok(vector)
    }
}

/// The eleven short-frame sequences that get aggregated.
#[derive(Debug, Clone)]
pub struct FrameFeatures {
    pub amplitude_envelope: Vec<f64>,
    pub rms: Vec<f64>,
    pub zero_crossing_rate: Vec<f64>,
    pub band_energy_ratio: Vec<f64>,
    pub spectral_centroid: Vec<f64>,
    pub spectral_bandwidth: Vec<f64>,
    /// `(n_bands + 1) × frames`, flattened
    pub spectral_contrast: Vec<f64>,
    pub spectral_flatness: Vec<f64>,
    pub spectral_rolloff: Vec<f64>,
    pub spectral_rolloff_upper: Vec<f64>,
    pub spectral_rolloff_lower: Vec<f64>,
}

impl FrameFeatures {
    pub fn compute(signal: &Signal, config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let samples = &signal.samples;
        let spectrum = Spectrum::compute(
            samples,
            signal.sample_rate,
            config.n_fft,
            config.stft_hop_length,
        );
        let spectral_centroid = spectral::centroid(&spectrum);
        let spectral_bandwidth = spectral::bandwidth(&spectrum, &spectral_centroid);

        Ok(Self {
            amplitude_envelope: time_domain::amplitude_envelope(samples, config.frame_length),
            rms: time_domain::rms(samples, config.frame_length, config.hop_length),
            zero_crossing_rate: time_domain::zero_crossing_rate(
                samples,
                config.frame_length,
                config.hop_length,
            ),
            band_energy_ratio: spectral::band_energy_ratio(&spectrum, config.split_frequency_hz),
            spectral_centroid,
            spectral_bandwidth,
            spectral_contrast: spectral::contrast(&spectrum, &config.contrast)?,
            spectral_flatness: spectral::flatness(&spectrum),
            spectral_rolloff: spectral::rolloff(&spectrum, config.rolloff.primary),
            spectral_rolloff_upper: spectral::rolloff(&spectrum, config.rolloff.upper),
            spectral_rolloff_lower: spectral::rolloff(&spectrum, config.rolloff.lower),
        })
    }

    pub fn sequence(&self, kind: FeatureKind) -> &[f64] {
        match kind {
            FeatureKind::AmplitudeEnvelope => &self.amplitude_envelope,
            FeatureKind::RootMeanSquareEnergy => &self.rms,
            FeatureKind::ZeroCrossingRate => &self.zero_crossing_rate,
            FeatureKind::BandEnergyRatio => &self.band_energy_ratio,
            FeatureKind::SpectralCentroid => &self.spectral_centroid,
            FeatureKind::SpectralBandwidth => &self.spectral_bandwidth,
            FeatureKind::SpectralContrast => &self.spectral_contrast,
            FeatureKind::SpectralFlatness => &self.spectral_flatness,
            FeatureKind::SpectralRolloff(RolloffLevel::Primary) => &self.spectral_rolloff,
            FeatureKind::SpectralRolloff(RolloffLevel::Upper) => &self.spectral_rolloff_upper,
            FeatureKind::SpectralRolloff(RolloffLevel::Lower) => &self.spectral_rolloff_lower,
        }
    }
}

/// Raw per-window values over multi-second windows.
#[derive(Debug, Clone)]
pub struct DistributedFeatures {
    pub amplitude_envelope: Vec<f64>,
    pub rms: Vec<f64>,
    pub zero_crossing_rate: Vec<f64>,
}

impl DistributedFeatures {
    pub fn compute(signal: &Signal, settings: &DistributedSettings) -> Self {
        let rate = signal.sample_rate as usize;
        let window = settings.window_seconds as usize * rate;
        let hop = settings.hop_seconds as usize * rate;
        let samples = &signal.samples;
        Self {
            amplitude_envelope: time_domain::amplitude_envelope(samples, window),
            rms: time_domain::rms(samples, window, hop),
            zero_crossing_rate: time_domain::zero_crossing_rate(samples, window, hop),
        }
    }

    /// Sequences exist only for [`DISTRIBUTED_FEATURES`]; any other kind has
    /// no long windows.
    pub fn windows(&self, kind: FeatureKind) -> &[f64] {
        match kind {
            FeatureKind::AmplitudeEnvelope => &self.amplitude_envelope,
            FeatureKind::RootMeanSquareEnergy => &self.rms,
            FeatureKind::ZeroCrossingRate => &self.zero_crossing_rate,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    const SR: u32 = 16_000;

    fn sine(frequency: f64, seconds: f64) -> Signal {
        let len = (SR as f64 * seconds) as usize;
        let samples = (0..len)
            .map(|i| (0.5 * (2.0 * PI * frequency * i as f64 / SR as f64).sin()) as f32)
            .collect();
        Signal::new(samples, SR)
    }

    #[test]
    fn ten_second_clip_fills_every_column() {
        let extractor = FeatureExtractor::default();
        let vector = extractor.extract_signal(7, &sine(440.0, 10.0)).unwrap();
        assert_eq!(vector.len(), 1 + 44 + 5 + 11 + 11);
        assert_eq!(vector.len(), extractor.vector_len());
        assert_eq!(vector[0], 7.0);
        assert!(vector.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn strict_policy_rejects_short_clip() {
        let extractor = FeatureExtractor::default();
        let err = extractor.extract_signal(0, &sine(440.0, 4.0)).unwrap_err();
        match err {
            ExtractionError::SchemaMismatch(mismatch) => {
                assert_eq!(mismatch.expected, 5);
                assert_eq!(mismatch.actual, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn fit_policy_pads_short_clip_with_nan() {
        let config = ExtractionConfig::default().with_policy(DurationPolicy::Fit);
        let extractor = FeatureExtractor::new(config);
        let vector = extractor.extract_signal(1, &sine(440.0, 4.0)).unwrap();
        assert_eq!(vector.len(), extractor.vector_len());

        // envelope windows start right after the 44 aggregated values
        let envelope = &vector[45..50];
        assert!(envelope[..2].iter().all(|v| v.is_finite()));
        assert!(envelope[2..].iter().all(|v| v.is_nan()));
    }

    #[test]
    fn fit_policy_truncates_long_clip() {
        let config = ExtractionConfig::default().with_policy(DurationPolicy::Fit);
        let extractor = FeatureExtractor::new(config);
        let vector = extractor.extract_signal(1, &sine(440.0, 13.0)).unwrap();
        assert_eq!(vector.len(), extractor.vector_len());
        assert!(vector.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn zero_rate_is_rejected() {
        let signal = Signal::new(vec![0.0; 16], 0);
        assert!(matches!(
            FeatureExtractor::default().extract_signal(0, &signal),
            Err(ExtractionError::InvalidParameter(_))
        ));
    }

    #[test]
    fn odd_long_window_is_rejected() {
        let mut config = ExtractionConfig::default();
        config.distributed.window_seconds = 1;
        let extractor = FeatureExtractor::new(config);
        let signal = Signal::new(vec![0.1; 16_001 * 10], 16_001);
        assert!(matches!(
            extractor.extract_signal(0, &signal),
            Err(ExtractionError::InvalidParameter(_))
        ));
        // same window at an even rate is fine
        assert!(extractor.extract_signal(0, &sine(440.0, 10.0)).is_ok());
    }

    #[test]
    fn sequence_lookup_covers_every_aggregated_kind() {
        let features = FrameFeatures::compute(&sine(440.0, 1.0), &ExtractionConfig::default())
            .unwrap();
        for kind in AGGREGATED_FEATURES {
            assert!(!features.sequence(kind).is_empty(), "{kind:?} is empty");
        }
        assert_eq!(features.rms.len(), 1 + 16_000 / 1024);
        assert_eq!(features.amplitude_envelope.len(), 8);
    }
}
