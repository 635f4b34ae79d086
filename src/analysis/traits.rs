//! Analysis trait abstractions
//!
//! Detection is allowed to degrade: `analyze` reports what went wrong, and
//! the provided `detect` turns any failure into a logged warning plus a
//! neutral result so a single bad file never aborts its job.

use crate::error::Result;
use crate::types::{AudioBuffer, BeatEstimate, ChordEvent};
use tracing::warn;

/// Chord timeline detection backend
pub trait ChordDetector: Send + Sync {
    /// Detect the chord timeline, reporting failures
    fn analyze(&self, buffer: &AudioBuffer) -> Result<Vec<ChordEvent>>;

    /// Get the name of this detector (for logging)
    fn name(&self) -> &'static str;

    /// Detect the chord timeline, degrading to an empty list on failure
    fn detect(&self, buffer: &AudioBuffer) -> Vec<ChordEvent> {
        match self.analyze(buffer) {
            Ok(events) => events,
            Err(e) => {
                warn!("Chord detection ({}) failed, continuing without chords: {}", self.name(), e);
                Vec::new()
            }
        }
    }
}

/// Tempo and beat detection backend
pub trait BeatDetector: Send + Sync {
    /// Estimate tempo and beat times, reporting failures
    fn analyze(&self, buffer: &AudioBuffer) -> Result<BeatEstimate>;

    /// Get the name of this detector (for logging)
    fn name(&self) -> &'static str;

    /// Estimate tempo and beat times, degrading to 120 BPM with no beats
    fn detect(&self, buffer: &AudioBuffer) -> BeatEstimate {
        match self.analyze(buffer) {
            Ok(estimate) => estimate,
            Err(e) => {
                warn!("Beat detection ({}) failed, using default tempo: {}", self.name(), e);
                BeatEstimate::default()
            }
        }
    }
}
