//! Short-Time Fourier Transform shared by chroma and onset analysis
//!
//! Frames are centered: the signal is zero-padded by `n_fft / 2` on both
//! sides, so frame `t` is centered on sample `t * hop_length` and a signal
//! of `n` samples yields `1 + n / hop_length` frames.

use rustfft::{num_complex::Complex, FftPlanner};

/// Magnitude spectrogram: `frames[t][k]` for time frame `t`, frequency bin `k`
#[derive(Debug, Clone)]
pub struct Spectrogram {
    pub frames: Vec<Vec<f32>>,
    pub n_fft: usize,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl Spectrogram {
    /// Number of positive-frequency bins (DC through Nyquist)
    pub fn num_bins(&self) -> usize {
        self.n_fft / 2 + 1
    }

    /// Number of time frames
    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// Center frequency of bin `k` in Hz
    pub fn bin_frequency(&self, k: usize) -> f32 {
        k as f32 * self.sample_rate as f32 / self.n_fft as f32
    }
}

/// Compute the magnitude STFT of a mono signal
pub fn magnitude_spectrogram(
    samples: &[f32],
    sample_rate: u32,
    n_fft: usize,
    hop_length: usize,
) -> Spectrogram {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(n_fft);
    let window = hann_window(n_fft);

    let pad = n_fft / 2;
    let num_frames = 1 + samples.len() / hop_length;
    let num_bins = n_fft / 2 + 1;
    let mut frames = Vec::with_capacity(num_frames);
    let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

    for frame_idx in 0..num_frames {
        // Position of window sample 0 in the unpadded signal
        let origin = (frame_idx * hop_length) as isize - pad as isize;

        for (i, (slot, &w)) in buffer.iter_mut().zip(window.iter()).enumerate() {
            let src = origin + i as isize;
            let sample = if src >= 0 && (src as usize) < samples.len() {
                samples[src as usize]
            } else {
                0.0
            };
            *slot = Complex::new(sample * w, 0.0);
        }

        fft.process(&mut buffer);

        frames.push(buffer[..num_bins].iter().map(|c| c.norm()).collect());
    }

    Spectrogram {
        frames,
        n_fft,
        hop_length,
        sample_rate,
    }
}

/// Periodic Hann window
pub fn hann_window(size: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..size)
        .map(|i| 0.5 * (1.0 - (2.0 * PI * i as f32 / size as f32).cos()))
        .collect()
}
