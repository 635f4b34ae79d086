//! Dynamic-programming beat tracker
//!
//! Beats are placed on a median-aggregated onset envelope by maximizing the
//! sum of onset strength at each beat minus a penalty for intervals that
//! stray from the estimated period. The tempo is then rounded and octave
//! corrected, and each beat is snapped to a nearby onset when one exists.

use super::onset::{frames_to_times, pick_onsets, Aggregate, SpectralFlux};
use super::tempo::estimate_tempo;
use crate::analysis::traits::BeatDetector;
use crate::config::BeatConfig;
use crate::error::{CliqchordError, Result};
use crate::types::{AudioBuffer, BeatEstimate};
use tracing::{debug, info};

/// Lowest tempo left untouched by octave correction
pub const MIN_CORRECTED_BPM: f64 = 60.0;
/// Highest tempo left untouched by octave correction
pub const MAX_CORRECTED_BPM: f64 = 200.0;

/// Gaussian width of the local score kernel, as a divisor of the period
const LOCAL_SCORE_WIDTH: f64 = 32.0;
/// Frames before the first beat whose local score is below this fraction
/// of the maximum cannot anchor a beat chain
const FIRST_BEAT_THRESHOLD: f64 = 0.01;

/// Onset-envelope beat tracker
#[derive(Debug, Clone, Default)]
pub struct BeatTracker {
    config: BeatConfig,
}

impl BeatTracker {
    pub fn new(config: BeatConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &BeatConfig {
        &self.config
    }
}

impl BeatDetector for BeatTracker {
    fn analyze(&self, buffer: &AudioBuffer) -> Result<BeatEstimate> {
        self.config.validate()?;
        if buffer.is_empty() || buffer.sample_rate == 0 {
            return Err(CliqchordError::analysis("Beat", "audio buffer is empty"));
        }

        let config = &self.config;
        let flux = SpectralFlux::compute(
            &buffer.samples,
            buffer.sample_rate,
            config.n_fft,
            config.hop_length,
            config.n_mels,
        );
        let envelope = flux.envelope(Aggregate::Median);
        let frame_rate = flux.frame_rate();

        let raw_bpm = match estimate_tempo(&envelope, frame_rate, config) {
            Some(bpm) => bpm,
            None => {
                debug!("Onset envelope is flat, no beats to track");
                return Ok(BeatEstimate {
                    bpm: correct_octave(config.start_bpm),
                    beat_times: vec![],
                });
            }
        };

        let beat_frames = track_beats(&envelope, frame_rate, raw_bpm, config.tightness, config.trim);
        let raw_times = frames_to_times(&beat_frames, buffer.sample_rate, config.hop_length);

        let onset_frames = pick_onsets(&flux.envelope(Aggregate::Mean), frame_rate);
        let onset_times = frames_to_times(&onset_frames, buffer.sample_rate, config.hop_length);

        let beat_times = refine_beats(&raw_times, &onset_times, config.refine_window, buffer.duration);
        let bpm = correct_octave(raw_bpm);

        info!(
            "Detected {} BPM (raw {:.2}) with {} beats, {} onsets",
            bpm,
            raw_bpm,
            beat_times.len(),
            onset_times.len()
        );

        Ok(BeatEstimate { bpm, beat_times })
    }

    fn name(&self) -> &'static str {
        "dp-onset"
    }
}

/// Round to an integer tempo, then double it below 60 or halve it above 200.
///
/// The correction is applied once and the result is not checked again, so a
/// genuine tempo far outside the expected range ends up mis-scaled.
pub fn correct_octave(raw_bpm: f64) -> f64 {
    let bpm = raw_bpm.round();
    if bpm < MIN_CORRECTED_BPM {
        bpm * 2.0
    } else if bpm > MAX_CORRECTED_BPM {
        bpm / 2.0
    } else {
        bpm
    }
}

/// Snap each beat to the nearest onset strictly closer than `window`
/// seconds, then clamp to `[0, duration]` and restore ordering
pub fn refine_beats(beats: &[f64], onsets: &[f64], window: f64, duration: f64) -> Vec<f64> {
    let mut refined: Vec<f64> = beats
        .iter()
        .map(|&beat| {
            let mut nearest: Option<(f64, f64)> = None;
            for &onset in onsets {
                let distance = (onset - beat).abs();
                if distance < window && nearest.map_or(true, |(_, best)| distance < best) {
                    nearest = Some((onset, distance));
                }
            }
            let snapped = nearest.map_or(beat, |(onset, _)| onset);
            snapped.clamp(0.0, duration.max(0.0))
        })
        .collect();

    refined.sort_by(|a, b| a.total_cmp(b));
    refined
}

/// Beat frame indices for an onset envelope at the given tempo
pub fn track_beats(
    envelope: &[f32],
    frame_rate: f64,
    bpm: f64,
    tightness: f64,
    trim: bool,
) -> Vec<usize> {
    if envelope.is_empty() || !(bpm > 0.0) {
        return Vec::new();
    }

    let period = ((60.0 * frame_rate / bpm).round() as usize).max(1);
    let local = local_score(envelope, period);
    let (backlink, cumscore) = dynamic_program(&local, period, tightness);

    let mut beats = vec![last_beat(&cumscore)];
    while let Some(prev) = beats.last().and_then(|&b| backlink[b]) {
        beats.push(prev);
    }
    beats.reverse();

    let beats = trim_beats(&local, beats, trim);
    debug!("Tracked {} beats at period {} frames", beats.len(), period);
    beats
}

/// Envelope normalized by its standard deviation and smoothed by a
/// Gaussian a sixteenth of a period wide
fn local_score(envelope: &[f32], period: usize) -> Vec<f64> {
    let n = envelope.len();
    let x: Vec<f64> = envelope.iter().map(|&v| v as f64).collect();

    let std = if n > 1 {
        let mean = x.iter().sum::<f64>() / n as f64;
        (x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64).sqrt()
    } else {
        0.0
    };
    let norm = std + f64::MIN_POSITIVE;

    let p = period as isize;
    let kernel: Vec<f64> = (-p..=p)
        .map(|k| (-0.5 * (k as f64 * LOCAL_SCORE_WIDTH / period as f64).powi(2)).exp())
        .collect();

    (0..n as isize)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(j, w)| {
                    let src = i - (j as isize - p);
                    (0..n as isize).contains(&src).then(|| w * x[src as usize] / norm)
                })
                .sum::<f64>()
        })
        .collect()
}

/// Cumulative score and best predecessor of every frame
fn dynamic_program(local: &[f64], period: usize, tightness: f64) -> (Vec<Option<usize>>, Vec<f64>) {
    let n = local.len();
    let p = period as isize;

    // Candidate predecessors lie between two periods and half a period back
    let offsets: Vec<isize> = (-2 * p..=-((period as f64 / 2.0).round() as isize)).collect();
    let penalties: Vec<f64> = offsets
        .iter()
        .map(|&off| -tightness * ((-off) as f64 / period as f64).ln().powi(2))
        .collect();

    let threshold = FIRST_BEAT_THRESHOLD * local.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    let mut backlink = vec![None; n];
    let mut cumscore = vec![0.0f64; n];
    let mut first_beat = true;

    for i in 0..n {
        let mut best_score = f64::NEG_INFINITY;
        let mut best_prev = -1isize;
        for (&off, &penalty) in offsets.iter().zip(&penalties) {
            let prev = i as isize + off;
            // Predecessors before the start contribute only their penalty
            let score = penalty + if prev >= 0 { cumscore[prev as usize] } else { 0.0 };
            if score > best_score {
                best_score = score;
                best_prev = prev;
            }
        }

        cumscore[i] = local[i] + best_score;
        if first_beat && local[i] < threshold {
            backlink[i] = None;
        } else {
            backlink[i] = usize::try_from(best_prev).ok();
            first_beat = false;
        }
    }

    (backlink, cumscore)
}

/// Last local maximum of the cumulative score that is strong relative to
/// the other maxima
fn last_beat(cumscore: &[f64]) -> usize {
    let n = cumscore.len();
    let maxima: Vec<usize> = (0..n)
        .filter(|&i| {
            let left = cumscore[i.saturating_sub(1)];
            let right = cumscore[(i + 1).min(n - 1)];
            cumscore[i] > left && cumscore[i] >= right
        })
        .collect();

    let mut peak_scores: Vec<f64> = maxima.iter().map(|&i| cumscore[i]).collect();
    peak_scores.sort_by(|a, b| a.total_cmp(b));
    let median = match peak_scores.len() {
        0 => f64::NAN,
        len if len % 2 == 1 => peak_scores[len / 2],
        len => 0.5 * (peak_scores[len / 2 - 1] + peak_scores[len / 2]),
    };

    maxima
        .iter()
        .rev()
        .copied()
        .find(|&i| cumscore[i] * 2.0 > median)
        .unwrap_or_else(|| {
            cumscore
                .iter()
                .enumerate()
                .fold(0, |best, (i, v)| if *v > cumscore[best] { i } else { best })
        })
}

/// Drop weak beats at either end of the sequence
fn trim_beats(local: &[f64], beats: Vec<usize>, trim: bool) -> Vec<usize> {
    if beats.is_empty() {
        return beats;
    }

    // Periodic five-point Hann window
    const SMOOTHING: [f64; 5] = [0.0, 0.345_491_502_8, 0.904_508_497_2, 0.904_508_497_2, 0.345_491_502_8];

    let strength: Vec<f64> = beats.iter().map(|&b| local[b]).collect();
    let m = strength.len() as isize;
    let smoothed: Vec<f64> = (0..m)
        .map(|i| {
            SMOOTHING
                .iter()
                .enumerate()
                .filter_map(|(k, w)| {
                    let src = i + 2 - k as isize;
                    (0..m).contains(&src).then(|| w * strength[src as usize])
                })
                .sum::<f64>()
        })
        .collect();

    let threshold = if trim {
        0.5 * (smoothed.iter().map(|v| v * v).sum::<f64>() / smoothed.len() as f64).sqrt()
    } else {
        0.0
    };

    let first = smoothed.iter().position(|&v| v > threshold);
    let last = smoothed.iter().rposition(|&v| v > threshold);
    match (first, last) {
        (Some(first), Some(last)) => beats[first..=last].to_vec(),
        _ => Vec::new(),
    }
}
