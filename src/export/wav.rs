//! Click track WAV output

use crate::error::{CliqchordError, Result};
use crate::types::ClickTrack;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write a click track as 16-bit PCM stereo at its own sample rate
pub fn write_click_wav(track: &ClickTrack, path: &Path) -> Result<PathBuf> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| CliqchordError::output_error(path, e))?;
        }
    }

    let audio = &track.audio;
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: audio.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let wav_error = |context: &str, e: hound::Error| CliqchordError::OutputError {
        path: path.to_path_buf(),
        reason: format!("{}: {}", context, e),
    };

    let mut writer =
        hound::WavWriter::create(path, spec).map_err(|e| wav_error("Failed to create WAV file", e))?;

    for sample in audio.interleaved() {
        let value = (sample * 32767.0).clamp(-32768.0, 32767.0) as i16;
        writer
            .write_sample(value)
            .map_err(|e| wav_error("Failed to write sample", e))?;
    }

    writer
        .finalize()
        .map_err(|e| wav_error("Failed to finalize WAV", e))?;

    debug!(
        "Wrote {:.1}s click track to {}",
        audio.duration,
        path.display()
    );
    Ok(path.to_path_buf())
}
