use std::f64::consts::PI;

use ndarray::Array2;
use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use super::time_domain::centered_frame_count;

/// Magnitude STFT, `bins × frames`.
#[derive(Debug, Clone)]
pub struct Spectrum {
    pub magnitude: Array2<f64>,
    pub sample_rate: u32,
    pub n_fft: usize,
}

impl Spectrum {
    /// Centred STFT with a periodic Hann window. Frames are zero padded by
    /// `n_fft / 2` at both ends, giving `1 + len / hop` frames.
    pub fn compute(samples: &[f32], sample_rate: u32, n_fft: usize, hop_length: usize) -> Self {
        let bins = n_fft / 2 + 1;
        let frames = centered_frame_count(samples.len(), n_fft, hop_length);
        let pad = n_fft / 2;
        let window = hann_window(n_fft);

        let mut planner = FftPlanner::<f64>::new();
        let fft = planner.plan_fft_forward(n_fft);
        let mut buffer = vec![Complex::new(0.0, 0.0); n_fft];
        let mut scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        let mut magnitude = Array2::zeros((bins, frames));

        for frame in 0..frames {
            let start = frame * hop_length;
            for (offset, slot) in buffer.iter_mut().enumerate() {
                let sample = (start + offset)
                    .checked_sub(pad)
                    .and_then(|index| samples.get(index))
                    .map_or(0.0, |&s| s as f64);
                *slot = Complex::new(sample * window[offset], 0.0);
            }
            fft.process_with_scratch(&mut buffer, &mut scratch);
            for (bin, value) in buffer.iter().take(bins).enumerate() {
                magnitude[[bin, frame]] = value.norm();
            }
        }

        Self {
            magnitude,
            sample_rate,
            n_fft,
        }
    }

    pub fn bins(&self) -> usize {
        self.magnitude.nrows()
    }

    pub fn frames(&self) -> usize {
        self.magnitude.ncols()
    }

    /// Centre frequency of every bin in Hz.
    pub fn frequencies(&self) -> Vec<f64> {
        let resolution = self.sample_rate as f64 / self.n_fft as f64;
        (0..self.bins()).map(|bin| bin as f64 * resolution).collect()
    }
}

fn hann_window(length: usize) -> Vec<f64> {
    (0..length)
        .map(|n| 0.5 - 0.5 * (2.0 * PI * n as f64 / length as f64).cos())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(frequency: f64, sample_rate: u32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * frequency * i as f64 / sample_rate as f64).sin() as f32)
            .collect()
    }

    #[test]
    fn shape_follows_centred_framing() {
        let spectrum = Spectrum::compute(&vec![0.0_f32; 16_000], 16_000, 2048, 512);
        assert_eq!(spectrum.bins(), 1025);
        assert_eq!(spectrum.frames(), 1 + 16_000 / 512);
    }

    #[test]
    fn peak_lands_on_tone_bin() {
        let sample_rate = 16_000;
        let samples = sine(1000.0, sample_rate, 16_000);
        let spectrum = Spectrum::compute(&samples, sample_rate, 2048, 512);
        let frame = spectrum.frames() / 2;
        let column = spectrum.magnitude.column(frame);
        let peak = column
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(bin, _)| bin)
            .unwrap();
        let expected = (1000.0 * 2048.0 / sample_rate as f64).round() as usize;
        assert_eq!(peak, expected);
        assert!((spectrum.frequencies()[peak] - 1000.0).abs() < 8.0);
    }

    #[test]
    fn empty_signal_gives_one_silent_frame() {
        let spectrum = Spectrum::compute(&[], 16_000, 2048, 512);
        assert_eq!(spectrum.frames(), 1);
        assert!(spectrum.magnitude.iter().all(|&m| m == 0.0));
    }
}
