//! Global tempo estimation from an onset envelope
//!
//! The envelope autocorrelation is weighted by a log-normal prior centred on
//! the start tempo, then the best lag is refined by parabolic interpolation.

use crate::config::BeatConfig;
use tracing::{debug, trace};

/// Width of the tempo prior in octaves
const PRIOR_OCTAVES: f64 = 1.0;

/// Gaussian width, in frames, applied to the envelope before autocorrelation
const SMOOTHING_SIGMA: f64 = 1.0;

/// Normalized autocorrelation `ac[lag] / ac[0]` for `lag < max_lag`
///
/// Returns `None` for an envelope with no energy.
pub fn autocorrelation(envelope: &[f32], max_lag: usize) -> Option<Vec<f64>> {
    let n = envelope.len();
    let max_lag = max_lag.min(n);
    let x: Vec<f64> = envelope.iter().map(|&v| v as f64).collect();

    let ac: Vec<f64> = (0..max_lag)
        .map(|lag| x[..n - lag].iter().zip(&x[lag..]).map(|(a, b)| a * b).sum())
        .collect();

    match ac.first() {
        Some(&zero) if zero > 0.0 => Some(ac.iter().map(|v| v / zero).collect()),
        _ => None,
    }
}

/// Estimate the dominant tempo in BPM, or `None` when the envelope carries
/// no periodicity that can be scored
pub fn estimate_tempo(envelope: &[f32], frame_rate: f64, config: &BeatConfig) -> Option<f64> {
    if envelope.is_empty() || !(frame_rate > 0.0) {
        return None;
    }

    let window = (config.autocorrelation_window * frame_rate).round() as usize;
    // A period that is not a whole number of frames alternates between two
    // lags; smoothing merges them back into one peak
    let ac = autocorrelation(&gaussian_smooth(envelope, SMOOTHING_SIGMA), window.max(2))?;

    let lag_min = ((60.0 * frame_rate / config.max_tempo).ceil() as usize).max(1);
    let lag_max = ((60.0 * frame_rate / config.min_tempo).floor() as usize).min(ac.len() - 1);
    if lag_min > lag_max {
        debug!(
            "No tempo lags available (lags {}..={}, {} frames)",
            lag_min,
            lag_max,
            envelope.len()
        );
        return None;
    }

    let log_start = config.start_bpm.log2();
    let score = |lag: usize| {
        let bpm = 60.0 * frame_rate / lag as f64;
        let prior = -0.5 * ((bpm.log2() - log_start) / PRIOR_OCTAVES).powi(2);
        (1.0 + 1e6 * ac[lag].max(0.0)).ln() + prior
    };

    let scores: Vec<f64> = (lag_min..=lag_max).map(score).collect();
    let best = scores
        .iter()
        .enumerate()
        .fold(0, |best, (i, s)| if *s > scores[best] { i } else { best });

    let lag = (lag_min + best) as f64 + parabolic_offset(&scores, best);
    let bpm = 60.0 * frame_rate / lag;
    trace!("Best tempo lag {:.2} frames ({:.2} BPM)", lag, bpm);

    bpm.is_finite().then_some(bpm)
}

fn gaussian_smooth(envelope: &[f32], sigma: f64) -> Vec<f32> {
    let radius = (3.0 * sigma).ceil() as isize;
    let kernel: Vec<f64> = (-radius..=radius)
        .map(|k| (-0.5 * (k as f64 / sigma).powi(2)).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();
    let n = envelope.len() as isize;

    (0..n)
        .map(|i| {
            let acc = kernel
                .iter()
                .zip(-radius..=radius)
                .filter_map(|(w, k)| {
                    let src = i + k;
                    (0..n).contains(&src).then(|| w * envelope[src as usize] as f64)
                })
                .sum::<f64>();
            (acc / norm) as f32
        })
        .collect()
}

/// Sub-sample peak offset in [-0.5, 0.5]
fn parabolic_offset(values: &[f64], i: usize) -> f64 {
    if i == 0 || i + 1 >= values.len() {
        return 0.0;
    }
    let (a, b, c) = (values[i - 1], values[i], values[i + 1]);
    let denom = a - 2.0 * b + c;
    if denom.abs() < f64::EPSILON {
        return 0.0;
    }
    (0.5 * (a - c) / denom).clamp(-0.5, 0.5)
}
