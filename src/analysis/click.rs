//! Click track synthesis
//!
//! Renders a metronome track aligned with detected beats. Every bar
//! downbeat gets a lower, louder accent click; the remaining beats get a
//! higher, quieter click. When no beats are available a constant grid is
//! laid out from the first onset of the source.

use crate::analysis::beats::detect_onset_times;
use crate::config::ClickConfig;
use crate::error::{CliqchordError, Result};
use crate::types::{AudioBuffer, BeatEstimate, ClickTrack, StereoBuffer, DEFAULT_BPM};
use std::f64::consts::PI;
use tracing::{debug, error, info};

/// Metronome renderer
#[derive(Debug, Clone, Default)]
pub struct ClickTrackSynthesizer {
    config: ClickConfig,
}

impl ClickTrackSynthesizer {
    pub fn new(config: ClickConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClickConfig {
        &self.config
    }

    /// Render a click track as long as `source`.
    ///
    /// Uses the estimate's beats when it has any, otherwise a fallback grid
    /// at the estimate's tempo (or 120 BPM). Failures are logged and
    /// returned to the caller.
    pub fn synthesize(&self, source: &AudioBuffer, estimate: Option<&BeatEstimate>) -> Result<ClickTrack> {
        self.render(source, estimate).map_err(|e| {
            error!("{}", e);
            e
        })
    }

    fn render(&self, source: &AudioBuffer, estimate: Option<&BeatEstimate>) -> Result<ClickTrack> {
        self.config
            .validate()
            .map_err(|e| CliqchordError::synthesis(e.to_string()))?;

        let duration = source.duration;
        if !duration.is_finite() || duration <= 0.0 {
            return Err(CliqchordError::synthesis(format!(
                "source duration must be positive, got {}",
                duration
            )));
        }

        let bpm = estimate.map_or(DEFAULT_BPM, |e| e.bpm);
        if !bpm.is_finite() || bpm <= 0.0 {
            return Err(CliqchordError::synthesis(format!("invalid tempo {} BPM", bpm)));
        }

        let beat_times = match estimate {
            Some(e) if !e.beat_times.is_empty() => e.beat_times.clone(),
            _ => {
                let phase = detect_onset_times(source).first().copied().unwrap_or(0.0);
                debug!("No beats supplied, using a {} BPM grid from {:.3}s", bpm, phase);
                beat_grid(phase, bpm, duration)
            }
        };

        let sr = self.config.sample_rate;
        let num_samples = (duration * sr as f64).round() as usize;
        let mut mono = vec![0.0f32; num_samples];

        let accent = self.click(self.config.accent_frequency, self.config.accent_amplitude);
        let regular = self.click(self.config.click_frequency, self.config.click_amplitude);

        for (i, &beat) in beat_times.iter().enumerate() {
            if beat < 0.0 {
                continue;
            }
            let start = (beat * sr as f64).floor() as usize;
            if start >= num_samples {
                continue;
            }
            let wave = if i % self.config.beats_per_bar == 0 {
                &accent
            } else {
                &regular
            };
            let end = (start + wave.len()).min(num_samples);
            for (out, sample) in mono[start..end].iter_mut().zip(wave) {
                *out += sample;
            }
        }

        let peak = mono.iter().fold(0.0f32, |acc, s| acc.max(s.abs()));
        if peak > 0.0 {
            let gain = self.config.peak_level / peak;
            mono.iter_mut().for_each(|s| *s *= gain);
        }

        info!(
            "Synthesized {:.1}s click track with {} beats at {} BPM",
            duration,
            beat_times.len(),
            bpm
        );

        Ok(ClickTrack {
            audio: StereoBuffer::from_mono(mono, sr),
            bpm,
            beat_times,
        })
    }

    /// One exponentially decaying sine click
    fn click(&self, frequency: f64, amplitude: f64) -> Vec<f32> {
        click_waveform(
            frequency,
            amplitude,
            self.config.click_duration,
            self.config.decay_rate,
            self.config.sample_rate,
        )
    }
}

/// `amplitude * sin(2πft) * exp(-decay·t)` sampled at `n = floor(duration·sr)`
/// points evenly spaced over `[0, duration]` inclusive
pub fn click_waveform(frequency: f64, amplitude: f64, duration: f64, decay: f64, sample_rate: u32) -> Vec<f32> {
    let n = (duration * sample_rate as f64).floor() as usize;
    let step = if n > 1 { duration / (n - 1) as f64 } else { 0.0 };
    (0..n)
        .map(|i| {
            let t = i as f64 * step;
            (amplitude * (2.0 * PI * frequency * t).sin() * (-decay * t).exp()) as f32
        })
        .collect()
}

/// Evenly spaced beats from `phase` up to (not including) `duration`
pub fn beat_grid(phase: f64, bpm: f64, duration: f64) -> Vec<f64> {
    let interval = 60.0 / bpm;
    (0..)
        .map(|k| phase + k as f64 * interval)
        .take_while(|&t| t < duration)
        .collect()
}
