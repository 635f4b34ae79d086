//! Onset strength and onset detection
//!
//! The onset envelope is the positive first difference of a log-power mel
//! spectrogram, aggregated across bands. Peak picking on that envelope
//! yields discrete onset frames.

use super::mel::MelFilterbank;
use crate::analysis::chroma::smoothing::median;
use crate::analysis::stft::magnitude_spectrogram;
use crate::types::AudioBuffer;

/// Floor applied before converting power to decibels
const AMIN: f32 = 1e-10;
/// Dynamic range kept below the loudest mel cell
const TOP_DB: f32 = 80.0;

/// Peak-picking windows in seconds
const PRE_MAX_SECONDS: f64 = 0.03;
const POST_MAX_SECONDS: f64 = 0.0;
const PRE_AVG_SECONDS: f64 = 0.10;
const POST_AVG_SECONDS: f64 = 0.10;
const WAIT_SECONDS: f64 = 0.03;
/// Threshold above the local mean on the [0, 1] normalized envelope
const PEAK_DELTA: f32 = 0.07;

/// Default framing used when onsets are needed outside beat tracking
pub const DEFAULT_N_FFT: usize = 2048;
pub const DEFAULT_HOP: usize = 512;
pub const DEFAULT_N_MELS: usize = 128;

/// How per-band flux is reduced to one value per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregate {
    Mean,
    Median,
}

/// Per-band positive spectral flux, aligned to STFT frames
#[derive(Debug, Clone)]
pub struct SpectralFlux {
    /// `bands[t][b]`; leading frames are zero padding
    bands: Vec<Vec<f32>>,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl SpectralFlux {
    pub fn compute(
        samples: &[f32],
        sample_rate: u32,
        n_fft: usize,
        hop_length: usize,
        n_mels: usize,
    ) -> Self {
        let spectrogram = magnitude_spectrogram(samples, sample_rate, n_fft, hop_length);
        let filterbank = MelFilterbank::new(sample_rate, n_fft, n_mels);

        let mut log_mel: Vec<Vec<f32>> = spectrogram
            .frames
            .iter()
            .map(|mags| {
                let power: Vec<f32> = mags.iter().map(|m| m * m).collect();
                filterbank
                    .apply(&power)
                    .into_iter()
                    .map(|p| 10.0 * p.max(AMIN).log10())
                    .collect()
            })
            .collect();

        let peak_db = log_mel
            .iter()
            .flatten()
            .cloned()
            .fold(f32::NEG_INFINITY, f32::max);
        let floor_db = peak_db - TOP_DB;
        for frame in log_mel.iter_mut() {
            frame.iter_mut().for_each(|v| *v = v.max(floor_db));
        }

        let num_frames = log_mel.len();
        // One frame of lag plus half a window so that a peak lands on the
        // frame centered at the onset
        let pad = 1 + n_fft / (2 * hop_length);
        let mut bands = vec![vec![0.0f32; n_mels]; pad.min(num_frames)];

        for t in 1..num_frames {
            if bands.len() >= num_frames {
                break;
            }
            bands.push(
                log_mel[t]
                    .iter()
                    .zip(log_mel[t - 1].iter())
                    .map(|(cur, prev)| (cur - prev).max(0.0))
                    .collect(),
            );
        }

        Self {
            bands,
            hop_length,
            sample_rate,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.bands.len()
    }

    /// Envelope frames per second
    pub fn frame_rate(&self) -> f64 {
        self.sample_rate as f64 / self.hop_length as f64
    }

    /// Onset strength envelope, one value per frame
    pub fn envelope(&self, aggregate: Aggregate) -> Vec<f32> {
        let mut scratch = Vec::new();
        self.bands
            .iter()
            .map(|frame| match aggregate {
                Aggregate::Mean => {
                    if frame.is_empty() {
                        0.0
                    } else {
                        frame.iter().sum::<f32>() / frame.len() as f32
                    }
                }
                Aggregate::Median => {
                    scratch.clear();
                    scratch.extend_from_slice(frame);
                    median(&mut scratch)
                }
            })
            .collect()
    }
}

/// Pick onset frames from an envelope
///
/// A frame is an onset if it is the maximum of its short look-back window,
/// exceeds the local mean by `PEAK_DELTA` after normalizing the envelope to
/// [0, 1], and is far enough from the previous onset.
pub fn pick_onsets(envelope: &[f32], frame_rate: f64) -> Vec<usize> {
    let lo = envelope.iter().cloned().fold(f32::INFINITY, f32::min);
    let hi = envelope.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    if envelope.is_empty() || !(hi > lo) {
        return Vec::new();
    }

    let x: Vec<f32> = envelope
        .iter()
        .map(|v| (v - lo) / (hi - lo + f32::MIN_POSITIVE))
        .collect();

    let frames = |seconds: f64| (seconds * frame_rate).floor() as usize;
    let pre_max = frames(PRE_MAX_SECONDS);
    let post_max = frames(POST_MAX_SECONDS) + 1;
    let pre_avg = frames(PRE_AVG_SECONDS);
    let post_avg = frames(POST_AVG_SECONDS) + 1;
    let wait = frames(WAIT_SECONDS);

    let n = x.len();
    let mut onsets = Vec::new();
    let mut last: Option<usize> = None;

    for i in 0..n {
        if x[i] <= 0.0 {
            continue;
        }

        let max_window = &x[i.saturating_sub(pre_max)..(i + post_max).min(n)];
        let local_max = max_window.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        if x[i] < local_max {
            continue;
        }

        let avg_window = &x[i.saturating_sub(pre_avg)..(i + post_avg).min(n)];
        let local_mean = avg_window.iter().sum::<f32>() / avg_window.len() as f32;
        if x[i] < local_mean + PEAK_DELTA {
            continue;
        }

        if last.map_or(true, |prev| i > prev + wait) {
            onsets.push(i);
            last = Some(i);
        }
    }

    onsets
}

/// Convert frame indices to seconds
pub fn frames_to_times(frames: &[usize], sample_rate: u32, hop_length: usize) -> Vec<f64> {
    let seconds_per_frame = hop_length as f64 / sample_rate as f64;
    frames.iter().map(|&f| f as f64 * seconds_per_frame).collect()
}

/// Onset times of a buffer using mean-aggregated flux and default framing
pub fn detect_onset_times(buffer: &AudioBuffer) -> Vec<f64> {
    if buffer.is_empty() || buffer.sample_rate == 0 {
        return Vec::new();
    }
    let flux = SpectralFlux::compute(
        &buffer.samples,
        buffer.sample_rate,
        DEFAULT_N_FFT,
        DEFAULT_HOP,
        DEFAULT_N_MELS,
    );
    let onsets = pick_onsets(&flux.envelope(Aggregate::Mean), flux.frame_rate());
    frames_to_times(&onsets, buffer.sample_rate, DEFAULT_HOP)
}
