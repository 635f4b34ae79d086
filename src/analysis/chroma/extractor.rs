//! Chroma (pitch-class energy) extraction
//!
//! STFT magnitudes are pooled onto a log-frequency grid with
//! `bins_per_octave` resolution (a constant-Q-like view of the spectrum),
//! the grid is folded into 12 pitch classes, each column is max-normalized,
//! and the result is median-smoothed along time.

use super::smoothing::median_filter_time;
use crate::analysis::stft::{magnitude_spectrogram, Spectrogram};
use crate::config::ChromaConfig;
use crate::error::{CliqchordError, Result};
use crate::types::{AudioBuffer, ChromaFrame, Chromagram};
use tracing::debug;

/// Reference pitch of grid bin 0 (C1)
const GRID_REFERENCE_HZ: f32 = 32.703_197;

/// Turns mono audio into a time-indexed chroma matrix
#[derive(Debug, Clone, Default)]
pub struct ChromaFeatureExtractor {
    config: ChromaConfig,
}

impl ChromaFeatureExtractor {
    pub fn new(config: ChromaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ChromaConfig {
        &self.config
    }

    /// Compute the smoothed chromagram of `buffer`
    pub fn extract(&self, buffer: &AudioBuffer) -> Result<Chromagram> {
        self.config.validate()?;

        if buffer.sample_rate == 0 {
            return Err(CliqchordError::analysis("chroma", "sample rate is zero"));
        }
        if buffer.is_empty() {
            return Err(CliqchordError::analysis("chroma", "audio buffer is empty"));
        }

        let spectrogram = magnitude_spectrogram(
            &buffer.samples,
            buffer.sample_rate,
            self.config.n_fft,
            self.config.hop_length,
        );

        let raw = self.fold_to_chroma(&spectrogram);
        let smoothed = median_filter_time(&raw, self.config.smoothing_width);

        let seconds_per_frame = self.config.hop_length as f64 / buffer.sample_rate as f64;
        let frames: Vec<ChromaFrame> = smoothed
            .into_iter()
            .enumerate()
            .map(|(t, vector)| ChromaFrame {
                vector,
                time_seconds: t as f64 * seconds_per_frame,
            })
            .collect();

        debug!(
            "Extracted {} chroma frames ({} bins per octave, hop {})",
            frames.len(),
            self.config.bins_per_octave,
            self.config.hop_length
        );

        Ok(Chromagram {
            frames,
            hop_length: self.config.hop_length,
            sample_rate: buffer.sample_rate,
        })
    }

    /// Pool STFT bins onto the log-frequency grid, then fold the grid into
    /// pitch classes. Columns are normalized to a peak of 1.
    fn fold_to_chroma(&self, spectrogram: &Spectrogram) -> Vec<[f32; 12]> {
        let bins_per_semitone = self.config.bins_per_octave / 12;
        let nyquist = spectrogram.sample_rate as f32 / 2.0;
        let fmax = self.config.fmax.min(nyquist);

        let bin_to_grid: Vec<Option<usize>> = (0..spectrogram.num_bins())
            .map(|k| {
                let freq = spectrogram.bin_frequency(k);
                if freq < self.config.fmin || freq > fmax {
                    return None;
                }
                let position =
                    self.config.bins_per_octave as f32 * (freq / GRID_REFERENCE_HZ).log2();
                Some(position.round().max(0.0) as usize)
            })
            .collect();

        let grid_len = bin_to_grid.iter().flatten().max().map_or(0, |&g| g + 1);

        // Each semitone owns `bins_per_semitone` grid bins centered on it
        let grid_to_pitch_class: Vec<usize> = (0..grid_len)
            .map(|g| ((g + bins_per_semitone / 2) / bins_per_semitone) % 12)
            .collect();

        let mut grid = vec![0.0f32; grid_len];

        spectrogram
            .frames
            .iter()
            .map(|magnitudes| {
                grid.iter_mut().for_each(|g| *g = 0.0);
                for (mag, slot) in magnitudes.iter().zip(bin_to_grid.iter()) {
                    if let Some(g) = *slot {
                        grid[g] = grid[g].max(*mag);
                    }
                }

                let mut chroma = [0.0f32; 12];
                for (energy, &pc) in grid.iter().zip(grid_to_pitch_class.iter()) {
                    chroma[pc] += *energy;
                }

                let peak = chroma.iter().cloned().fold(0.0f32, f32::max);
                if peak > f32::MIN_POSITIVE {
                    chroma.iter_mut().for_each(|c| *c /= peak);
                }
                chroma
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    fn tone_mix(freqs: &[f32], seconds: f32, sr: u32) -> AudioBuffer {
        let n = (seconds * sr as f32) as usize;
        let samples = (0..n)
            .map(|i| {
                let t = i as f32 / sr as f32;
                freqs.iter().map(|f| (2.0 * PI * f * t).sin()).sum::<f32>() / freqs.len() as f32
            })
            .collect();
        AudioBuffer::new(samples, sr)
    }

    fn strongest_bins(vector: &[f32; 12], count: usize) -> Vec<usize> {
        let mut idx: Vec<usize> = (0..12).collect();
        idx.sort_by(|&a, &b| vector[b].total_cmp(&vector[a]));
        let mut top = idx[..count].to_vec();
        top.sort_unstable();
        top
    }

    #[test]
    fn test_single_tone_maps_to_pitch_class() {
        // A4
        let buffer = tone_mix(&[440.0], 2.0, 22050);
        let chroma = ChromaFeatureExtractor::default().extract(&buffer).unwrap();
        let mid = chroma.frames[chroma.len() / 2].vector;
        assert_eq!(strongest_bins(&mid, 1), vec![9]);
        assert!((mid[9] - 1.0).abs() < 1e-6, "column should be peak-normalized");
    }

    #[test]
    fn test_c_major_triad_energy() {
        let buffer = tone_mix(&[261.63, 329.63, 392.0], 2.0, 22050);
        let chroma = ChromaFeatureExtractor::default().extract(&buffer).unwrap();
        let mid = chroma.frames[chroma.len() / 2].vector;
        assert_eq!(strongest_bins(&mid, 3), vec![0, 4, 7]);
    }

    #[test]
    fn test_frame_count_and_times() {
        let buffer = AudioBuffer::new(vec![0.0; 220500], 22050);
        let chroma = ChromaFeatureExtractor::default().extract(&buffer).unwrap();
        assert_eq!(chroma.len(), 431);
        assert!((chroma.frames[1].time_seconds - 512.0 / 22050.0).abs() < 1e-12);
        // Silence stays silent rather than being normalized into noise
        assert!(chroma.frames.iter().all(|f| f.vector.iter().all(|&v| v == 0.0)));
    }

    #[test]
    fn test_empty_buffer_is_analysis_error() {
        let buffer = AudioBuffer::new(vec![], 22050);
        let err = ChromaFeatureExtractor::default().extract(&buffer).unwrap_err();
        assert!(err.is_recoverable());
    }
}
