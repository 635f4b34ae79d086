//! cliqchord - chord timelines and click tracks for audio files
//!
//! A command-line utility that batch-analyzes audio files to extract a
//! chord timeline and a beat grid, and renders a metronome click track
//! aligned with the detected beats.
//!
//! # Architecture
//!
//! - `config`: CLI argument parsing, runtime settings, per-component parameters
//! - `discovery`: File scanning and project ID generation
//! - `audio`: Decoding to mono at the analysis rate using symphonia
//! - `analysis`: Chroma, chord matching and segmentation, onset/tempo/beat
//!   tracking, click synthesis
//! - `pipeline`: Parallel per-file jobs
//! - `export`: Chord JSON, click WAV and batch summary output
//!
//! # Example
//!
//! ```no_run
//! use cliqchord::analysis::{BeatDetector, BeatTracker, ChordDetector, ClickTrackSynthesizer, TemplateChordDetector};
//!
//! let buffer = cliqchord::audio::decode(std::path::Path::new("song.wav"))?;
//! let chords = TemplateChordDetector::default().detect(&buffer);
//! let beats = BeatTracker::default().detect(&buffer);
//! let click = ClickTrackSynthesizer::default().synthesize(&buffer, Some(&beats))?;
//! println!("{} chords, {} BPM, {} clicks", chords.len(), beats.bpm, click.beat_times.len());
//! # Ok::<(), cliqchord::CliqchordError>(())
//! ```

pub mod analysis;
pub mod audio;
pub mod config;
pub mod discovery;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod types;

pub use error::{CliqchordError, Result};
pub use types::{AudioBuffer, BeatEstimate, ChordEvent, ClickTrack, ProjectAnalysis, StereoBuffer};
