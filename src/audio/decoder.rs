//! Audio decoding using symphonia
//!
//! Decodes audio files to mono f32 samples at the analysis sample rate.
//! Uses rubato for resampling with proper anti-aliasing.

use crate::config::ANALYSIS_SAMPLE_RATE;
use crate::error::{CliqchordError, Result};
use crate::types::AudioBuffer;
use rubato::{FftFixedInOut, Resampler};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::{debug, trace};

/// Maximum file size we'll attempt to decode (2GB)
const MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

/// Resampler chunk size in input frames
const CHUNK_SIZE: usize = 1024;

/// Decode an audio file to a mono buffer at 22050 Hz
pub fn decode(path: &Path) -> Result<AudioBuffer> {
    decode_to_rate(path, ANALYSIS_SAMPLE_RATE)
}

/// Decode an audio file to a mono buffer at `target_rate`
pub fn decode_to_rate(path: &Path, target_rate: u32) -> Result<AudioBuffer> {
    let metadata = std::fs::metadata(path).map_err(|e| {
        CliqchordError::decode_error(path, format!("Failed to read file metadata: {}", e))
    })?;

    if metadata.len() > MAX_FILE_SIZE {
        return Err(CliqchordError::decode_error(
            path,
            format!(
                "File too large ({:.1} GB). Maximum supported size is 2 GB.",
                metadata.len() as f64 / (1024.0 * 1024.0 * 1024.0)
            ),
        ));
    }

    let (mut format, mut decoder, track_id, source_rate, channels) = open_track(path)?;

    debug!(
        "Decoding: {} @ {}Hz, {} channels",
        path.display(),
        source_rate,
        channels
    );

    let mono = collect_mono(path, format.as_mut(), decoder.as_mut(), track_id, channels)?;

    if mono.is_empty() {
        return Err(CliqchordError::decode_error(path, "No audio samples decoded"));
    }

    let samples = resample(&mono, source_rate, target_rate);

    debug!(
        "Decoded {} samples ({:.2}s)",
        samples.len(),
        samples.len() as f64 / target_rate as f64
    );

    Ok(AudioBuffer::new(samples, target_rate))
}

type OpenedTrack = (Box<dyn FormatReader>, Box<dyn Decoder>, u32, u32, usize);

/// Probe the container and build a decoder for its first audio track
fn open_track(path: &Path) -> Result<OpenedTrack> {
    let file = std::fs::File::open(path)
        .map_err(|e| CliqchordError::decode_error(path, format!("Failed to open file: {}", e)))?;

    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| CliqchordError::decode_error(path, format!("Failed to probe format: {}", e)))?;

    let format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| CliqchordError::decode_error(path, "No audio tracks found"))?;

    let track_id = track.id;
    let codec_params = track.codec_params.clone();
    let source_rate = codec_params.sample_rate.unwrap_or(44100);
    let channels = codec_params.channels.map(|c| c.count()).unwrap_or(2);

    let decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| {
            CliqchordError::decode_error(path, format!("Failed to create decoder: {}", e))
        })?;

    Ok((format, decoder, track_id, source_rate, channels))
}

/// Read every packet of the track and downmix it to mono
fn collect_mono(
    path: &Path,
    format: &mut dyn FormatReader,
    decoder: &mut dyn Decoder,
    track_id: u32,
    channels: usize,
) -> Result<Vec<f32>> {
    let mut mono: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(symphonia::core::errors::Error::IoError(e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                break;
            }
            Err(e) => {
                return Err(CliqchordError::decode_error(
                    path,
                    format!("Failed to read packet: {}", e),
                ));
            }
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(symphonia::core::errors::Error::DecodeError(e)) => {
                trace!("Skipping corrupted frame: {}", e);
                continue;
            }
            Err(e) => {
                return Err(CliqchordError::decode_error(path, format!("Decode error: {}", e)));
            }
        };

        let spec = *decoded.spec();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        mono.extend(to_mono(sample_buf.samples(), channels));
    }

    Ok(mono)
}

/// Convert interleaved multi-channel audio to mono by averaging channels
fn to_mono(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    samples
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

/// FFT-based resampling via rubato, falling back to linear interpolation
/// if the resampler cannot be built or fails mid-stream
fn resample(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() {
        return samples.to_vec();
    }

    let mut resampler =
        match FftFixedInOut::<f32>::new(from_rate as usize, to_rate as usize, CHUNK_SIZE, 1) {
            Ok(r) => r,
            Err(e) => {
                debug!("Rubato initialization failed ({}), using fallback", e);
                return resample_linear(samples, from_rate, to_rate);
            }
        };

    let frames_in = resampler.input_frames_next();
    let ratio = to_rate as f64 / from_rate as f64;
    let expected_len = (samples.len() as f64 * ratio).ceil() as usize;
    // Filter latency; these leading output frames precede the first input frame
    let delay = resampler.output_delay();

    let mut output = Vec::with_capacity(expected_len + delay + resampler.output_frames_max());
    let mut pos = 0;
    // Keep feeding zero chunks past the end until the delayed tail is flushed
    while output.len() < delay + expected_len {
        let end = (pos + frames_in).min(samples.len());
        let mut chunk = if pos < end {
            samples[pos..end].to_vec()
        } else {
            Vec::new()
        };
        chunk.resize(frames_in, 0.0);

        match resampler.process(&[chunk], None) {
            Ok(resampled) => match resampled.into_iter().next() {
                Some(channel) => output.extend(channel),
                None => break,
            },
            Err(e) => {
                debug!("Rubato processing error ({}), using fallback", e);
                return resample_linear(samples, from_rate, to_rate);
            }
        }

        pos += frames_in;
    }

    output.drain(..delay.min(output.len()));
    output.truncate(expected_len);
    output
}

/// Linear interpolation resampler; may alias
fn resample_linear(samples: &[f32], from_rate: u32, to_rate: u32) -> Vec<f32> {
    if from_rate == to_rate || samples.is_empty() || to_rate == 0 {
        return samples.to_vec();
    }

    let step = from_rate as f64 / to_rate as f64;
    let output_len = (samples.len() as f64 / step) as usize;
    let last = samples.len() - 1;

    (0..output_len)
        .map(|i| {
            let src_pos = i as f64 * step;
            let idx = src_pos as usize;
            let frac = (src_pos - idx as f64) as f32;
            if idx < last {
                samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
            } else {
                samples[idx.min(last)]
            }
        })
        .collect()
}
