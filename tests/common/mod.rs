#![allow(dead_code)]

use std::f32::consts::TAU;
use std::fs;
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavSpec, WavWriter};

pub const SAMPLE_RATE: u32 = 16_000;

pub fn sine(frequency: f32, seconds: f32) -> Vec<f32> {
    let len = (SAMPLE_RATE as f32 * seconds) as usize;
    (0..len)
        .map(|i| 0.5 * (TAU * frequency * i as f32 / SAMPLE_RATE as f32).sin())
        .collect()
}

/// Write a 16-bit mono WAV fixture, creating parent folders.
pub fn write_wav(path: &Path, samples: &[f32]) -> PathBuf {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let spec = WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).unwrap();
    for &sample in samples {
        writer
            .write_sample((sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
            .unwrap();
    }
    writer.finalize().unwrap();
    path.to_path_buf()
}

/// Five clips in one machine folder; `c.wav` is not audio.
pub fn corpus_with_corrupt_file(root: &Path, seconds: f32) -> PathBuf {
    let folder = root.join("6_dB_fan/fan/id_00/normal");
    let tones = [
        ("a.wav", 220.0),
        ("b.wav", 440.0),
        ("d.wav", 1500.0),
        ("e.wav", 3000.0),
    ];
    for (name, frequency) in tones {
        write_wav(&folder.join(name), &sine(frequency, seconds));
    }
    fs::write(folder.join("c.wav"), b"this is not a wav file at all").unwrap();
    folder
}
