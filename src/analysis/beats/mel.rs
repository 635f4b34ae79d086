//! Triangular mel filterbank (Slaney scale, area-normalized)

/// Break between the linear and logarithmic parts of the Slaney scale
const MIN_LOG_HZ: f64 = 1000.0;
const LINEAR_HZ_PER_MEL: f64 = 200.0 / 3.0;

fn min_log_mel() -> f64 {
    MIN_LOG_HZ / LINEAR_HZ_PER_MEL
}

fn log_step() -> f64 {
    6.4f64.ln() / 27.0
}

pub fn hz_to_mel(hz: f64) -> f64 {
    if hz < MIN_LOG_HZ {
        hz / LINEAR_HZ_PER_MEL
    } else {
        min_log_mel() + (hz / MIN_LOG_HZ).ln() / log_step()
    }
}

pub fn mel_to_hz(mel: f64) -> f64 {
    if mel < min_log_mel() {
        mel * LINEAR_HZ_PER_MEL
    } else {
        MIN_LOG_HZ * (log_step() * (mel - min_log_mel())).exp()
    }
}

/// Sparse filterbank: for each band, `(fft_bin, weight)` pairs
#[derive(Debug, Clone)]
pub struct MelFilterbank {
    bands: Vec<Vec<(usize, f32)>>,
}

impl MelFilterbank {
    /// Filters spanning 0 Hz to Nyquist for an `n_fft`-point spectrum
    pub fn new(sample_rate: u32, n_fft: usize, n_mels: usize) -> Self {
        let num_bins = n_fft / 2 + 1;
        let nyquist = sample_rate as f64 / 2.0;
        let max_mel = hz_to_mel(nyquist);

        let edges: Vec<f64> = (0..n_mels + 2)
            .map(|i| mel_to_hz(max_mel * i as f64 / (n_mels + 1) as f64))
            .collect();

        let bin_hz = sample_rate as f64 / n_fft as f64;

        let bands = (0..n_mels)
            .map(|m| {
                let (lo, center, hi) = (edges[m], edges[m + 1], edges[m + 2]);
                let area_norm = 2.0 / (hi - lo);
                (0..num_bins)
                    .filter_map(|k| {
                        let f = k as f64 * bin_hz;
                        let rising = (f - lo) / (center - lo);
                        let falling = (hi - f) / (hi - center);
                        let weight = rising.min(falling);
                        (weight > 0.0).then(|| (k, (weight * area_norm) as f32))
                    })
                    .collect()
            })
            .collect();

        Self { bands }
    }

    pub fn num_bands(&self) -> usize {
        self.bands.len()
    }

    /// Project a power spectrum onto the mel bands
    pub fn apply(&self, power: &[f32]) -> Vec<f32> {
        self.bands
            .iter()
            .map(|band| {
                band.iter()
                    .filter_map(|&(k, w)| power.get(k).map(|p| p * w))
                    .sum()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mel_scale_round_trip_points() {
        assert!((hz_to_mel(1000.0) - 15.0).abs() < 1e-9);
        assert!((mel_to_hz(15.0) - 1000.0).abs() < 1e-6);
        assert!((mel_to_hz(hz_to_mel(4000.0)) - 4000.0).abs() < 1e-6);
    }

    #[test]
    fn test_filterbank_shape() {
        let fb = MelFilterbank::new(22050, 2048, 128);
        assert_eq!(fb.num_bands(), 128);
        let flat = vec![1.0f32; 1025];
        let out = fb.apply(&flat);
        assert_eq!(out.len(), 128);
        // Upper bands are wide enough to always catch FFT bins
        assert!(out[64..].iter().all(|&v| v > 0.0));
    }
}
