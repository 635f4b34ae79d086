//! Configuration and CLI handling

pub mod analysis;
pub mod cli;
pub mod settings;

pub use analysis::{
    BeatConfig, ChordConfig, ChromaConfig, ClickConfig, ANALYSIS_SAMPLE_RATE, CLICK_SAMPLE_RATE,
};
pub use cli::Cli;
pub use settings::Settings;
