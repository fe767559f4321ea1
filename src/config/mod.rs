use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::features::registry::{FeatureKind, RolloffLevel};

/// Immutable extraction settings shared by the extractor and the column schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtractionConfig {
    /// Frame length in samples for the envelope, RMS and ZCR.
    pub frame_length: usize,
    /// Hop between RMS/ZCR frames.
    pub hop_length: usize,
    pub n_fft: usize,
    pub stft_hop_length: usize,
    /// Cutoff for the band energy ratio.
    pub split_frequency_hz: f64,
    pub rolloff: RolloffThresholds,
    pub contrast: ContrastSettings,
    pub distributed: DistributedSettings,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            frame_length: 2048,
            hop_length: 1024,
            n_fft: 2048,
            stft_hop_length: 512,
            split_frequency_hz: 1000.0,
            rolloff: RolloffThresholds::default(),
            contrast: ContrastSettings::default(),
            distributed: DistributedSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RolloffThresholds {
    pub primary: f64,
    pub upper: f64,
    pub lower: f64,
}

impl Default for RolloffThresholds {
    fn default() -> Self {
        Self {
            primary: 0.5,
            upper: 0.99,
            lower: 0.01,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContrastSettings {
    /// Upper edge of the lowest octave band.
    pub fmin_hz: f64,
    pub n_bands: usize,
    pub quantile: f64,
}

impl Default for ContrastSettings {
    fn default() -> Self {
        Self {
            fmin_hz: 200.0,
            n_bands: 6,
            quantile: 0.02,
        }
    }
}

/// What to do when a clip yields a different number of long windows than
/// its configured duration implies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationPolicy {
    /// Reject the clip with a schema mismatch.
    #[default]
    Strict,
    /// Truncate extra windows and pad missing ones with NaN.
    Fit,
}

/// Long-window features sampled at whole-second granularity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DistributedSettings {
    /// Clip duration the schema is built for.
    pub clip_seconds: u32,
    pub window_seconds: u32,
    pub hop_seconds: u32,
    pub policy: DurationPolicy,
}

impl Default for DistributedSettings {
    fn default() -> Self {
        Self {
            clip_seconds: 10,
            window_seconds: 2,
            hop_seconds: 1,
            policy: DurationPolicy::Strict,
        }
    }
}

impl DistributedSettings {
    /// Non-overlapping windows covering the clip, last partial one included.
    pub fn envelope_windows(&self) -> usize {
        (self.clip_seconds as usize).div_ceil(self.window_seconds as usize)
    }

    /// Centred frames: one per hop plus the frame at t = 0. Holds when the
    /// window spans an even number of samples; extraction rejects odd ones.
    pub fn framed_windows(&self) -> usize {
        1 + self.clip_seconds as usize / self.hop_seconds as usize
    }
}

impl ExtractionConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(self.frame_length > 0, "frame_length must be positive");
        ensure!(self.hop_length > 0, "hop_length must be positive");
        ensure!(self.n_fft >= 2, "n_fft must be at least 2, got {}", self.n_fft);
        ensure!(self.stft_hop_length > 0, "stft_hop_length must be positive");
        ensure!(
            self.split_frequency_hz.is_finite() && self.split_frequency_hz > 0.0,
            "split_frequency_hz must be positive, got {}",
            self.split_frequency_hz
        );

        for (name, value) in [
            ("rolloff.primary", self.rolloff.primary),
            ("rolloff.upper", self.rolloff.upper),
            ("rolloff.lower", self.rolloff.lower),
        ] {
            ensure!(
                value > 0.0 && value <= 1.0,
                "{} must be within (0, 1], got {}",
                name,
                value
            );
        }

        let upper = FeatureKind::SpectralRolloff(RolloffLevel::Upper).label(self);
        let lower = FeatureKind::SpectralRolloff(RolloffLevel::Lower).label(self);
        ensure!(
            upper != lower,
            "rolloff.upper ({}) and rolloff.lower ({}) both map to column {}",
            self.rolloff.upper,
            self.rolloff.lower,
            upper
        );

        ensure!(
            self.contrast.fmin_hz.is_finite() && self.contrast.fmin_hz > 0.0,
            "contrast.fmin_hz must be positive"
        );
        ensure!(self.contrast.n_bands >= 1, "contrast.n_bands must be at least 1");
        ensure!(
            self.contrast.quantile > 0.0 && self.contrast.quantile < 1.0,
            "contrast.quantile must be within (0, 1), got {}",
            self.contrast.quantile
        );

        ensure!(
            self.distributed.clip_seconds > 0,
            "distributed.clip_seconds must be positive"
        );
        ensure!(
            self.distributed.window_seconds > 0,
            "distributed.window_seconds must be positive"
        );
        ensure!(
            self.distributed.hop_seconds > 0,
            "distributed.hop_seconds must be positive"
        );
        Ok(())
    }

    pub fn with_policy(mut self, policy: DurationPolicy) -> Self {
        self.distributed.policy = policy;
        self
    }
}

/// Load a configuration from a file or an inline JSON string, or fall back to
/// defaults when neither is given. The result is validated.
pub fn load_config(path: Option<&Path>, json: Option<&str>) -> Result<ExtractionConfig> {
    let config = if let Some(p) = path {
        let data =
            fs::read_to_string(p).with_context(|| format!("Failed to read config file {:?}", p))?;
        parse_config(&data)?
    } else if let Some(raw) = json {
        parse_config(raw)?
    } else {
        ExtractionConfig::default()
    };
    config.validate().context("Config validation failed")?;
    Ok(config)
}

fn parse_config(raw: &str) -> Result<ExtractionConfig> {
    serde_json::from_str(raw).context("Failed to parse config JSON")
}
