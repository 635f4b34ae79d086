//! Audio analysis modules
//!
//! Chord and beat detection sit behind traits so the pipeline can swap
//! backends. Click synthesis consumes the beat estimate.

pub mod beats;
pub mod chords;
pub mod chroma;
pub mod click;
pub mod stft;
pub mod traits;

pub use traits::{BeatDetector, ChordDetector};

pub use beats::BeatTracker;
pub use chords::{ChordSegmenter, ChordTemplateMatcher, ChordTemplateSet, TemplateChordDetector};
pub use chroma::ChromaFeatureExtractor;
pub use click::ClickTrackSynthesizer;
