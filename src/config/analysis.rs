//! Per-component analysis parameters
//!
//! Every detector and the synthesizer take one of these structs explicitly,
//! so each call can be tested in isolation with its own parameters.

use crate::error::{CliqchordError, Result};
use std::ops::RangeInclusive;

/// Sample rate all analysis runs at
pub const ANALYSIS_SAMPLE_RATE: u32 = 22050;

/// Sample rate of the synthesized click track
pub const CLICK_SAMPLE_RATE: u32 = 44100;

/// Allowed tempo prior; silent input reports it as the tempo
pub const START_BPM_RANGE: RangeInclusive<f64> = 60.0..=200.0;

/// Chromagram extraction parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ChromaConfig {
    /// Samples between successive chroma frames
    pub hop_length: usize,
    /// STFT window length
    pub n_fft: usize,
    /// Lowest frequency folded into chroma (C2)
    pub fmin: f32,
    /// Highest frequency folded into chroma (C8)
    pub fmax: f32,
    /// Resolution of the log-frequency grid (3 bins per semitone)
    pub bins_per_octave: usize,
    /// Median filter width along time, in frames
    pub smoothing_width: usize,
}

impl Default for ChromaConfig {
    fn default() -> Self {
        Self {
            hop_length: 512,
            n_fft: 4096,
            fmin: 65.406,
            fmax: 4186.01,
            bins_per_octave: 36,
            smoothing_width: 5,
        }
    }
}

impl ChromaConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hop_length == 0 {
            return Err(CliqchordError::ConfigError("hop_length must be positive".into()));
        }
        if self.n_fft < 2 {
            return Err(CliqchordError::ConfigError(format!(
                "n_fft must be at least 2 (got {})",
                self.n_fft
            )));
        }
        if !(self.fmin > 0.0 && self.fmax > self.fmin) {
            return Err(CliqchordError::ConfigError(format!(
                "chroma frequency range is empty ({} - {} Hz)",
                self.fmin, self.fmax
            )));
        }
        if self.bins_per_octave == 0 || self.bins_per_octave % 12 != 0 {
            return Err(CliqchordError::ConfigError(format!(
                "bins_per_octave must be a positive multiple of 12 (got {})",
                self.bins_per_octave
            )));
        }
        if self.smoothing_width == 0 {
            return Err(CliqchordError::ConfigError(
                "smoothing_width must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Chord segmentation parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ChordConfig {
    pub chroma: ChromaConfig,
    /// Window length in seconds
    pub segment_duration: f64,
    /// Windows must score strictly above this to be kept
    pub min_confidence: f64,
    /// Coalesced events shorter than this are dropped as noise
    pub min_event_duration: f64,
}

impl Default for ChordConfig {
    fn default() -> Self {
        Self {
            chroma: ChromaConfig::default(),
            segment_duration: 1.0,
            min_confidence: 0.65,
            min_event_duration: 0.5,
        }
    }
}

impl ChordConfig {
    pub fn hop_length(&self) -> usize {
        self.chroma.hop_length
    }

    pub fn validate(&self) -> Result<()> {
        self.chroma.validate()?;
        if !(self.segment_duration.is_finite() && self.segment_duration > 0.0) {
            return Err(CliqchordError::ConfigError(format!(
                "segment_duration must be positive (got {})",
                self.segment_duration
            )));
        }
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(CliqchordError::ConfigError(format!(
                "min_confidence must be within [0, 1] (got {})",
                self.min_confidence
            )));
        }
        if self.min_event_duration < 0.0 {
            return Err(CliqchordError::ConfigError(
                "min_event_duration cannot be negative".into(),
            ));
        }
        Ok(())
    }
}

/// Beat tracking parameters
#[derive(Debug, Clone, PartialEq)]
pub struct BeatConfig {
    pub hop_length: usize,
    /// STFT window for the onset envelope
    pub n_fft: usize,
    /// Mel bands the onset flux is aggregated over
    pub n_mels: usize,
    /// Center of the tempo prior
    pub start_bpm: f64,
    /// Preference for evenly spaced beats
    pub tightness: f64,
    /// Drop weak beats at the start and end
    pub trim: bool,
    /// Tempo search range
    pub min_tempo: f64,
    pub max_tempo: f64,
    /// Lag window for tempo autocorrelation, seconds
    pub autocorrelation_window: f64,
    /// Beats snap to onsets strictly closer than this, seconds
    pub refine_window: f64,
}

impl Default for BeatConfig {
    fn default() -> Self {
        Self {
            hop_length: 512,
            n_fft: 2048,
            n_mels: 128,
            start_bpm: 120.0,
            tightness: 100.0,
            trim: true,
            min_tempo: 30.0,
            max_tempo: 320.0,
            autocorrelation_window: 8.0,
            refine_window: 0.05,
        }
    }
}

impl BeatConfig {
    pub fn validate(&self) -> Result<()> {
        if self.hop_length == 0 || self.n_fft < 2 || self.n_mels == 0 {
            return Err(CliqchordError::ConfigError(
                "hop_length, n_fft and n_mels must be positive".into(),
            ));
        }
        if !START_BPM_RANGE.contains(&self.start_bpm) {
            return Err(CliqchordError::ConfigError(format!(
                "start_bpm must be within {} - {} BPM (got {})",
                START_BPM_RANGE.start(),
                START_BPM_RANGE.end(),
                self.start_bpm
            )));
        }
        if !(self.tightness.is_finite() && self.tightness > 0.0) {
            return Err(CliqchordError::ConfigError(format!(
                "tightness must be positive (got {})",
                self.tightness
            )));
        }
        if !(self.min_tempo > 0.0 && self.max_tempo > self.min_tempo) {
            return Err(CliqchordError::ConfigError(format!(
                "tempo range is empty ({} - {} BPM)",
                self.min_tempo, self.max_tempo
            )));
        }
        if self.autocorrelation_window <= 0.0 || self.refine_window < 0.0 {
            return Err(CliqchordError::ConfigError(
                "autocorrelation_window must be positive and refine_window non-negative".into(),
            ));
        }
        Ok(())
    }
}

/// Click waveform parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ClickConfig {
    pub sample_rate: u32,
    /// Length of one click in seconds
    pub click_duration: f64,
    /// Frequency of regular (non-accented) beats
    pub click_frequency: f64,
    pub click_amplitude: f64,
    /// Frequency of the downbeat
    pub accent_frequency: f64,
    pub accent_amplitude: f64,
    /// Exponential envelope rate, 1/s
    pub decay_rate: f64,
    /// Every n-th beat (starting at 0) is accented
    pub beats_per_bar: usize,
    /// Peak level after normalization
    pub peak_level: f32,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            sample_rate: CLICK_SAMPLE_RATE,
            click_duration: 0.03,
            click_frequency: 1400.0,
            click_amplitude: 0.5,
            accent_frequency: 900.0,
            accent_amplitude: 0.9,
            decay_rate: 50.0,
            beats_per_bar: 4,
            peak_level: 0.8,
        }
    }
}

impl ClickConfig {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(CliqchordError::ConfigError("click sample_rate must be positive".into()));
        }
        if !(self.click_duration.is_finite() && self.click_duration > 0.0) {
            return Err(CliqchordError::ConfigError(format!(
                "click_duration must be positive (got {})",
                self.click_duration
            )));
        }
        let nyquist = self.sample_rate as f64 / 2.0;
        for (name, freq) in [
            ("click_frequency", self.click_frequency),
            ("accent_frequency", self.accent_frequency),
        ] {
            if !(freq > 0.0 && freq < nyquist) {
                return Err(CliqchordError::ConfigError(format!(
                    "{} must be within (0, {}) Hz (got {})",
                    name, nyquist, freq
                )));
            }
        }
        if self.beats_per_bar == 0 {
            return Err(CliqchordError::ConfigError("beats_per_bar must be at least 1".into()));
        }
        if !(self.peak_level > 0.0 && self.peak_level <= 1.0) {
            return Err(CliqchordError::ConfigError(format!(
                "peak_level must be within (0, 1] (got {})",
                self.peak_level
            )));
        }
        Ok(())
    }
}
