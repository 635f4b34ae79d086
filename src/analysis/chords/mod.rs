//! Chord detection: chroma extraction, template matching, segmentation

pub mod matcher;
pub mod segmenter;
pub mod templates;

pub use matcher::{ChordMatch, ChordTemplateMatcher};
pub use segmenter::{coalesce, ChordSegmenter};
pub use templates::{ChordTemplate, ChordTemplateSet};

use crate::analysis::chroma::ChromaFeatureExtractor;
use crate::analysis::traits::ChordDetector;
use crate::config::ChordConfig;
use crate::error::Result;
use crate::types::{AudioBuffer, ChordEvent};
use std::sync::Arc;
use tracing::info;

/// Chromagram template-matching chord detector
#[derive(Debug, Clone)]
pub struct TemplateChordDetector {
    config: ChordConfig,
    extractor: ChromaFeatureExtractor,
    segmenter: ChordSegmenter,
}

impl TemplateChordDetector {
    /// Detector using the standard template registry
    pub fn new(config: ChordConfig) -> Self {
        Self::with_templates(config, Arc::new(ChordTemplateSet::standard()))
    }

    pub fn with_templates(config: ChordConfig, templates: Arc<ChordTemplateSet>) -> Self {
        let extractor = ChromaFeatureExtractor::new(config.chroma.clone());
        let segmenter = ChordSegmenter::new(ChordTemplateMatcher::new(templates), &config);
        Self {
            config,
            extractor,
            segmenter,
        }
    }
}

impl Default for TemplateChordDetector {
    fn default() -> Self {
        Self::new(ChordConfig::default())
    }
}

impl ChordDetector for TemplateChordDetector {
    fn analyze(&self, buffer: &AudioBuffer) -> Result<Vec<ChordEvent>> {
        self.config.validate()?;
        let chroma = self.extractor.extract(buffer)?;
        let events = self.segmenter.segment(&chroma);
        info!("Detected {} chords", events.len());
        Ok(events)
    }

    fn name(&self) -> &'static str {
        "chroma-template"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_c_major_sine_chord_end_to_end() {
        let sr = 22050u32;
        let samples: Vec<f32> = (0..sr as usize * 10)
            .map(|i| {
                let t = i as f32 / sr as f32;
                [261.63f32, 329.63, 392.0]
                    .iter()
                    .map(|f| (2.0 * PI * f * t).sin() / 3.0)
                    .sum::<f32>()
            })
            .collect();
        let buffer = AudioBuffer::new(samples, sr);

        let events = TemplateChordDetector::default().analyze(&buffer).unwrap();
        assert_eq!(events.len(), 1, "Expected one merged event, got {:?}", events);
        assert_eq!(events[0].chord_label, "C");
        assert!(events[0].confidence > 0.65);
        assert!(
            (events[0].duration_seconds - 10.0).abs() < 0.1,
            "duration {}",
            events[0].duration_seconds
        );
    }

    #[test]
    fn test_failure_degrades_to_empty_timeline() {
        let detector = TemplateChordDetector::default();
        let empty = AudioBuffer::new(vec![], 22050);
        assert!(detector.analyze(&empty).is_err());
        assert!(detector.detect(&empty).is_empty());
    }

    #[test]
    fn test_silence_has_no_chords() {
        let detector = TemplateChordDetector::default();
        let silence = AudioBuffer::new(vec![0.0; 22050 * 3], 22050);
        assert!(detector.detect(&silence).is_empty());
    }
}
