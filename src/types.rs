//! Core data types for cliqchord
//!
//! These types represent the domain model and flow through the pipeline.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// =============================================================================
// Musical primitives
// =============================================================================

/// The 12 pitch classes in Western music
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PitchClass {
    C,
    Cs, // C#/Db
    D,
    Ds, // D#/Eb
    E,
    F,
    Fs, // F#/Gb
    G,
    Gs, // G#/Ab
    A,
    As, // A#/Bb
    B,
}

impl PitchClass {
    /// All pitch classes in chroma-bin order
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Convert from numeric index, wrapping modulo 12 (0 = C, 1 = C#, ..., 11 = B)
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % 12]
    }

    /// Convert to numeric index (0 = C, 1 = C#, ..., 11 = B)
    pub fn to_index(self) -> usize {
        self as usize
    }

    /// Sharp-based note name used in chord labels (e.g., "C", "F#")
    pub fn to_standard_notation(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }
}

// =============================================================================
// Chroma features
// =============================================================================

/// One column of the chroma matrix
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromaFrame {
    /// Pitch-class energies, index 0 = C ... 11 = B
    pub vector: [f32; 12],
    /// Center time of the analysis window
    pub time_seconds: f64,
}

/// Time-ordered chroma matrix with the framing it was computed with
#[derive(Debug, Clone)]
pub struct Chromagram {
    pub frames: Vec<ChromaFrame>,
    pub hop_length: usize,
    pub sample_rate: u32,
}

impl Chromagram {
    /// Number of frames (T)
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Seconds covered by `frames` hop windows
    pub fn frames_to_seconds(&self, frames: usize) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        frames as f64 * self.hop_length as f64 / self.sample_rate as f64
    }
}

// =============================================================================
// Analysis results
// =============================================================================

/// Sentinel label for "no chord"
pub const NO_CHORD: &str = "N";

/// A detected chord span on the timeline
///
/// Serialized with the short keys consumed by chord viewers:
/// `{"time", "chord", "confidence", "duration"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    #[serde(rename = "time")]
    pub time_seconds: f64,
    #[serde(rename = "chord")]
    pub chord_label: String,
    /// Match confidence in [0, 1], rounded to 2 decimals
    pub confidence: f64,
    #[serde(rename = "duration")]
    pub duration_seconds: f64,
}

impl ChordEvent {
    /// End of the span in seconds
    pub fn end_seconds(&self) -> f64 {
        self.time_seconds + self.duration_seconds
    }
}

/// Default tempo used when beat detection degrades
pub const DEFAULT_BPM: f64 = 120.0;

/// Tempo and beat positions for a track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BeatEstimate {
    /// Octave-corrected integer tempo
    pub bpm: f64,
    /// Non-decreasing beat times in seconds
    pub beat_times: Vec<f64>,
}

impl Default for BeatEstimate {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            beat_times: vec![],
        }
    }
}

/// Synthesized click audio plus what it was built from
#[derive(Debug, Clone)]
pub struct ClickTrack {
    pub audio: StereoBuffer,
    /// BPM the click grid corresponds to
    pub bpm: f64,
    /// Beat times that were actually placed (detected or fallback grid)
    pub beat_times: Vec<f64>,
}

/// Per-file result recorded in the batch summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectAnalysis {
    /// Deterministic ID derived from the source path
    pub project_id: String,
    /// Original file path
    pub path: PathBuf,
    pub duration_seconds: f64,
    pub bpm: f64,
    pub beat_count: usize,
    pub chord_count: usize,
    pub chords_path: PathBuf,
    pub click_path: PathBuf,
    /// Timestamp of analysis
    pub analyzed_at: chrono::DateTime<chrono::Utc>,
}

// =============================================================================
// Audio buffer types
// =============================================================================

/// Decoded audio samples ready for analysis
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    /// Mono samples normalized to [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl AudioBuffer {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        // Guard against division by zero - use 0 duration for invalid sample rate
        let duration = if sample_rate > 0 {
            samples.len() as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            samples,
            sample_rate,
            duration,
        }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Two-channel audio buffer
#[derive(Debug, Clone)]
pub struct StereoBuffer {
    /// Left channel samples normalized to [-1.0, 1.0]
    pub left: Vec<f32>,
    /// Right channel samples normalized to [-1.0, 1.0]
    pub right: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration: f64,
}

impl StereoBuffer {
    pub fn new(left: Vec<f32>, right: Vec<f32>, sample_rate: u32) -> Self {
        let num_samples = left.len().min(right.len());
        let duration = if sample_rate > 0 {
            num_samples as f64 / sample_rate as f64
        } else {
            0.0
        };
        Self {
            left,
            right,
            sample_rate,
            duration,
        }
    }

    /// Duplicate a mono signal into both channels
    pub fn from_mono(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self::new(samples.clone(), samples, sample_rate)
    }

    /// Number of samples per channel
    pub fn len(&self) -> usize {
        self.left.len()
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.left.is_empty()
    }

    /// Get interleaved samples [L, R, L, R, ...]
    pub fn interleaved(&self) -> Vec<f32> {
        let mut result = Vec::with_capacity(self.left.len() * 2);
        for (l, r) in self.left.iter().zip(self.right.iter()) {
            result.push(*l);
            result.push(*r);
        }
        result
    }
}

// =============================================================================
// Supported formats
// =============================================================================

/// Audio formats supported by cliqchord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Mp3,
    Wav,
    Flac,
    Aiff,
}

impl AudioFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(AudioFormat::Mp3),
            "wav" => Some(AudioFormat::Wav),
            "flac" => Some(AudioFormat::Flac),
            "aiff" | "aif" => Some(AudioFormat::Aiff),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_class_wraps() {
        assert_eq!(PitchClass::from_index(0), PitchClass::C);
        assert_eq!(PitchClass::from_index(13), PitchClass::Cs);
        assert_eq!(PitchClass::from_index(11).to_standard_notation(), "B");
        for (i, pc) in PitchClass::ALL.iter().enumerate() {
            assert_eq!(pc.to_index(), i);
        }
    }

    #[test]
    fn test_chord_event_json_keys() {
        let event = ChordEvent {
            time_seconds: 1.5,
            chord_label: "Am".to_string(),
            confidence: 0.87,
            duration_seconds: 2.0,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["time"], 1.5);
        assert_eq!(json["chord"], "Am");
        assert_eq!(json["confidence"], 0.87);
        assert_eq!(json["duration"], 2.0);
        assert!((event.end_seconds() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn test_stereo_interleaving() {
        let stereo = StereoBuffer::new(vec![0.1, 0.2], vec![-0.1, -0.2], 44100);
        assert_eq!(stereo.interleaved(), vec![0.1, -0.1, 0.2, -0.2]);
        let mono = StereoBuffer::from_mono(vec![0.5; 441], 44100);
        assert_eq!(mono.left, mono.right);
        assert!((mono.duration - 0.01).abs() < 1e-9);
    }

    #[test]
    fn test_beat_estimate_default() {
        let estimate = BeatEstimate::default();
        assert_eq!(estimate.bpm, 120.0);
        assert!(estimate.beat_times.is_empty());
    }
}
