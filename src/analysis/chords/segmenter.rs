//! Fixed-window chord segmentation of a chromagram

use super::matcher::ChordTemplateMatcher;
use crate::analysis::chroma::smoothing::median;
use crate::config::ChordConfig;
use crate::types::{ChordEvent, Chromagram};
use tracing::{debug, trace};

/// Slices a chromagram into windows and turns confident matches into events
#[derive(Debug, Clone)]
pub struct ChordSegmenter {
    matcher: ChordTemplateMatcher,
    segment_duration: f64,
    min_confidence: f64,
    min_event_duration: f64,
}

impl ChordSegmenter {
    pub fn new(matcher: ChordTemplateMatcher, config: &ChordConfig) -> Self {
        Self {
            matcher,
            segment_duration: config.segment_duration,
            min_confidence: config.min_confidence,
            min_event_duration: config.min_event_duration,
        }
    }

    /// Window length in frames, never less than one
    pub fn segment_frames(&self, chroma: &Chromagram) -> usize {
        if chroma.hop_length == 0 {
            return 1;
        }
        let frames =
            (self.segment_duration * chroma.sample_rate as f64 / chroma.hop_length as f64) as usize;
        frames.max(1)
    }

    /// Produce the ordered, non-overlapping chord timeline.
    ///
    /// Windows whose best match is not strictly above the confidence
    /// threshold are dropped, leaving a gap rather than an "N" span.
    pub fn segment(&self, chroma: &Chromagram) -> Vec<ChordEvent> {
        let seg = self.segment_frames(chroma);
        let mut events = Vec::new();
        let mut band = Vec::with_capacity(seg);

        for start in (0..chroma.len()).step_by(seg) {
            let end = (start + seg).min(chroma.len());
            let window = &chroma.frames[start..end];

            let mut summary = [0.0f32; 12];
            for (b, value) in summary.iter_mut().enumerate() {
                band.clear();
                band.extend(window.iter().map(|f| f.vector[b]));
                *value = median(&mut band);
            }

            let matched = self.matcher.match_vector(&summary);
            trace!(
                "Window {}..{}: {} ({:.3})",
                start,
                end,
                matched.label,
                matched.confidence
            );

            if matched.confidence > self.min_confidence {
                events.push(ChordEvent {
                    time_seconds: window[0].time_seconds,
                    chord_label: matched.label,
                    confidence: round_to_hundredths(matched.confidence),
                    duration_seconds: chroma.frames_to_seconds(end - start),
                });
            }
        }

        let raw_count = events.len();
        let merged = coalesce(events);
        let kept: Vec<ChordEvent> = merged
            .into_iter()
            .filter(|e| e.duration_seconds >= self.min_event_duration)
            .collect();
        // Dropping a short event can make its neighbours adjacent duplicates
        let events = coalesce(kept);

        debug!(
            "Segmented {} windows into {} chord events ({} confident windows)",
            chroma.len().div_ceil(seg),
            events.len(),
            raw_count
        );

        events
    }
}

/// Merge runs of adjacent events sharing a label into the first event of
/// the run, summing durations
pub fn coalesce(events: Vec<ChordEvent>) -> Vec<ChordEvent> {
    let mut merged: Vec<ChordEvent> = Vec::with_capacity(events.len());
    for event in events {
        match merged.last_mut() {
            Some(last) if last.chord_label == event.chord_label => {
                last.duration_seconds += event.duration_seconds;
            }
            _ => merged.push(event),
        }
    }
    merged
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
