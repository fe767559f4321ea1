//! Per-frame features derived from one shared magnitude spectrum.

use ndarray::{Array2, ArrayView1, Axis};

use super::spectrum::Spectrum;
use crate::config::ContrastSettings;
use crate::error::ExtractionError;

const AMPLITUDE_FLOOR: f64 = 1e-5;
const POWER_FLOOR: f64 = 1e-10;
const TOP_DB: f64 = 80.0;

/// Bin where the high band starts: `floor(split / ((sr / 2) / bins))`,
/// clamped to the bin count.
pub fn split_bin(spectrum: &Spectrum, split_frequency_hz: f64) -> usize {
    let bins = spectrum.bins();
    let hz_per_bin = (spectrum.sample_rate as f64 / 2.0) / bins as f64;
    let bin = (split_frequency_hz / hz_per_bin).floor();
    if bin.is_finite() && bin >= 0.0 {
        (bin as usize).min(bins)
    } else {
        bins
    }
}

/// Sum of low-band log power over sum of high-band log power, per frame.
/// A zero denominator yields an infinite or NaN ratio.
pub fn band_energy_ratio(spectrum: &Spectrum, split_frequency_hz: f64) -> Vec<f64> {
    let split = split_bin(spectrum, split_frequency_hz);
    let decibels = to_decibels(&spectrum.magnitude, 20.0, AMPLITUDE_FLOOR);
    decibels
        .axis_iter(Axis(1))
        .map(|frame| {
            let low: f64 = frame.iter().take(split).sum();
            let high: f64 = frame.iter().skip(split).sum();
            low / high
        })
        .collect()
}

/// Magnitude-weighted mean frequency. Silent frames give 0.
pub fn centroid(spectrum: &Spectrum) -> Vec<f64> {
    let frequencies = spectrum.frequencies();
    spectrum
        .magnitude
        .axis_iter(Axis(1))
        .map(|frame| {
            let total = normalizer(frame);
            frame
                .iter()
                .zip(&frequencies)
                .map(|(m, f)| m / total * f)
                .sum()
        })
        .collect()
}

/// Second-order spread around the centroid.
pub fn bandwidth(spectrum: &Spectrum, centroids: &[f64]) -> Vec<f64> {
    let frequencies = spectrum.frequencies();
    spectrum
        .magnitude
        .axis_iter(Axis(1))
        .zip(centroids)
        .map(|(frame, &centre)| {
            let total = normalizer(frame);
            frame
                .iter()
                .zip(&frequencies)
                .map(|(m, f)| m / total * (f - centre).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .collect()
}

/// Octave-band peak/valley contrast in dB, `(n_bands + 1) × frames` values
/// flattened band by band.
pub fn contrast(
    spectrum: &Spectrum,
    settings: &ContrastSettings,
) -> Result<Vec<f64>, ExtractionError> {
    let nyquist = spectrum.sample_rate as f64 / 2.0;
    let n_bands = settings.n_bands;

    let mut edges = vec![0.0];
    edges.extend((0..=n_bands).map(|k| settings.fmin_hz * 2f64.powi(k as i32)));
    if edges[..=n_bands].iter().any(|&edge| edge >= nyquist) {
        return Err(ExtractionError::InvalidParameter(format!(
            "contrast band edge {} Hz exceeds the Nyquist frequency {} Hz; reduce fmin_hz or n_bands",
            edges[n_bands], nyquist
        )));
    }

    let frequencies = spectrum.frequencies();
    let last_bin = spectrum.bins() - 1;
    let frames = spectrum.frames();
    let mut peaks = Array2::zeros((n_bands + 1, frames));
    let mut valleys = Array2::zeros((n_bands + 1, frames));

    for band in 0..=n_bands {
        let (low, high) = (edges[band], edges[band + 1]);
        let first = frequencies.iter().position(|&f| f >= low);
        let last = frequencies.iter().rposition(|&f| f <= high);
        let (first, last) = match (first, last) {
            (Some(first), Some(last)) if first <= last => (first, last),
            _ => {
                return Err(ExtractionError::InvalidParameter(format!(
                    "contrast band {}-{} Hz contains no frequency bins",
                    low, high
                )))
            }
        };

        let start = if band > 0 { first.saturating_sub(1) } else { first };
        let end = if band == n_bands { last_bin } else { last };
        let member_bins = end - start + 1;
        // every band but the top drops its highest bin
        let used_end = if band < n_bands { end } else { end + 1 };
        let quantile_len =
            ((settings.quantile * member_bins as f64).round_ties_even() as usize).max(1);

        for (frame, column) in spectrum.magnitude.axis_iter(Axis(1)).enumerate() {
            let mut values: Vec<f64> = column
                .iter()
                .skip(start)
                .take(used_end - start)
                .copied()
                .collect();
            values.sort_by(|a, b| a.total_cmp(b));
            let take = quantile_len.min(values.len());
            valleys[[band, frame]] = mean(&values[..take]);
            peaks[[band, frame]] = mean(&values[values.len() - take..]);
        }
    }

    let peaks = to_decibels(&peaks, 10.0, POWER_FLOOR);
    let valleys = to_decibels(&valleys, 10.0, POWER_FLOOR);
    Ok((&peaks - &valleys).iter().copied().collect())
}

/// Geometric over arithmetic mean of the power spectrum.
pub fn flatness(spectrum: &Spectrum) -> Vec<f64> {
    spectrum
        .magnitude
        .axis_iter(Axis(1))
        .map(|frame| {
            let power: Vec<f64> = frame.iter().map(|m| (m * m).max(POWER_FLOOR)).collect();
            let log_mean = power.iter().map(|p| p.ln()).sum::<f64>() / power.len() as f64;
            let arithmetic = power.iter().sum::<f64>() / power.len() as f64;
            log_mean.exp() / arithmetic
        })
        .collect()
}

/// Lowest bin frequency whose cumulative magnitude reaches `percent` of the
/// frame total.
pub fn rolloff(spectrum: &Spectrum, percent: f64) -> Vec<f64> {
    let frequencies = spectrum.frequencies();
    spectrum
        .magnitude
        .axis_iter(Axis(1))
        .map(|frame| {
            let threshold = percent * frame.sum();
            let mut cumulative = 0.0;
            for (m, f) in frame.iter().zip(&frequencies) {
                cumulative += m;
                if cumulative >= threshold {
                    return *f;
                }
            }
            f64::NAN
        })
        .collect()
}

/// `multiplier · log10(max(floor, x))`, clamped to `TOP_DB` below the peak
/// of the whole matrix.
fn to_decibels(values: &Array2<f64>, multiplier: f64, floor: f64) -> Array2<f64> {
    let decibels = values.mapv(|v| multiplier * v.max(floor).log10());
    let peak = decibels.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    decibels.mapv(|v| v.max(peak - TOP_DB))
}

fn normalizer(frame: ArrayView1<f64>) -> f64 {
    let total = frame.sum();
    if total > f64::MIN_POSITIVE {
        total
    } else {
        1.0
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
