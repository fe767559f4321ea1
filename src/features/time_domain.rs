//! Frame-wise waveform features.
//!
//! RMS and zero-crossing rate use centred frames: the signal is padded by
//! half a frame on both sides, so frame `i` is centred on sample `i * hop`
//! and a signal of `n` samples yields `1 + n / hop` frames (even frame
//! lengths). RMS pads with zeros, ZCR repeats the edge samples.

/// Samples with a magnitude at or below this count as zero.
const ZERO_THRESHOLD: f32 = 1e-10;

/// Maximum (signed) sample of each non-overlapping frame. The final partial
/// frame is kept.
pub fn amplitude_envelope(samples: &[f32], frame_length: usize) -> Vec<f64> {
    samples
        .chunks(frame_length.max(1))
        .map(|frame| {
            frame
                .iter()
                .copied()
                .fold(f32::NEG_INFINITY, f32::max) as f64
        })
        .collect()
}

pub fn rms(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let frames = centered_frame_count(samples.len(), frame_length, hop_length);
    let pad = frame_length / 2;
    (0..frames)
        .map(|frame| {
            let start = frame * hop_length;
            let energy: f64 = (start..start + frame_length)
                .filter_map(|padded| padded.checked_sub(pad))
                .filter_map(|index| samples.get(index))
                .map(|&s| (s as f64) * (s as f64))
                .sum();
            (energy / frame_length as f64).sqrt()
        })
        .collect()
}

/// Fraction of sign changes between consecutive samples of each frame.
pub fn zero_crossing_rate(samples: &[f32], frame_length: usize, hop_length: usize) -> Vec<f64> {
    let frames = centered_frame_count(samples.len(), frame_length, hop_length);
    let pad = frame_length / 2;
    let at = |padded: usize| -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let index = padded.saturating_sub(pad).min(samples.len() - 1);
        let value = samples[index];
        if value.abs() <= ZERO_THRESHOLD {
            0.0
        } else {
            value
        }
    };

    (0..frames)
        .map(|frame| {
            let start = frame * hop_length;
            let crossings = (start + 1..start + frame_length)
                .filter(|&padded| {
                    at(padded).is_sign_negative() != at(padded - 1).is_sign_negative()
                })
                .count();
            crossings as f64 / frame_length as f64
        })
        .collect()
}

pub(crate) fn centered_frame_count(len: usize, frame_length: usize, hop_length: usize) -> usize {
    let padded = len + 2 * (frame_length / 2);
    if frame_length == 0 || hop_length == 0 || padded < frame_length {
        return 0;
    }
    1 + (padded - frame_length) / hop_length
}
