//! Batch processing pipeline

pub mod orchestrator;

pub use orchestrator::{run, PipelineResult, CHORDS_FILE_NAME, CLICK_FILE_NAME};
