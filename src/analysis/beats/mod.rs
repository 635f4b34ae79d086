//! Tempo and beat detection from onset strength

pub mod mel;
pub mod onset;
pub mod tempo;
pub mod tracker;

pub use onset::{detect_onset_times, Aggregate, SpectralFlux};
pub use tempo::estimate_tempo;
pub use tracker::{correct_octave, refine_beats, track_beats, BeatTracker};
