use std::path::Path;

use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal as _};
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::conv::IntoSample;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

use crate::error::DecodeError;
use crate::types::Signal;

/// Decode an audio file to mono f32 samples at its native sample rate
pub fn load<P: AsRef<Path>>(path: P) -> Result<Signal, DecodeError> {
    let path = path.as_ref();

    // Open the file
    let file = std::fs::File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    // Probe the container, using the extension as a hint
    let mut hint = Hint::new();
    if let Some(extension) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(extension);
    }

    let probe_result = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|source| DecodeError::Unsupported {
            path: path.to_path_buf(),
            source,
        })?;

    let mut format = probe_result.format;

    // First track with a real codec
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| DecodeError::NoAudioTrack(path.to_path_buf()))?;

    let track_id = track.id;
    let sample_rate = track
        .codec_params
        .sample_rate
        .ok_or_else(|| DecodeError::MissingSampleRate(path.to_path_buf()))?;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|source| DecodeError::Unsupported {
            path: path.to_path_buf(),
            source,
        })?;

    let corrupt = |source: SymphoniaError| DecodeError::Corrupt {
        path: path.to_path_buf(),
        source,
    };

    // Decode every packet of that track, mixing down as we go
    let mut samples = Vec::new();
    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(err))
                if err.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(err) => return Err(corrupt(err)),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = decoder.decode(&packet).map_err(corrupt)?;
        mix_down(&decoded, &mut samples);
    }

    if samples.is_empty() {
        return Err(DecodeError::Empty(path.to_path_buf()));
    }

    tracing::trace!(
        path = %path.display(),
        samples = samples.len(),
        sample_rate,
        "decoded audio"
    );

    Ok(Signal {
        samples,
        sample_rate,
    })
}

/// Append the buffer to `out` as mono f32, averaging channels
fn mix_down(buffer: &AudioBufferRef, out: &mut Vec<f32>) {
    match buffer {
        AudioBufferRef::U8(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::U16(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::U24(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::U32(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::S8(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::S16(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::S24(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::S32(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::F32(buf) => mix_channels(buf.as_ref(), out),
        AudioBufferRef::F64(buf) => mix_channels(buf.as_ref(), out),
    }
}

fn mix_channels<S>(buf: &AudioBuffer<S>, out: &mut Vec<f32>)
where
    S: Sample + IntoSample<f32>,
{
    let num_channels = buf.spec().channels.count();
    let frames = buf.frames();
    if num_channels == 0 {
        return;
    }

    out.reserve(frames);
    // Mono needs no averaging
    if num_channels == 1 {
        out.extend(buf.chan(0).iter().map(|&s| -> f32 { s.into_sample() }));
        return;
    }

    for i in 0..frames {
        let sum: f32 = (0..num_channels)
            .map(|ch| -> f32 { buf.chan(ch)[i].into_sample() })
            .sum();
        out.push(sum / num_channels as f32);
    }
}
