//! Runtime configuration settings

use super::analysis::{BeatConfig, ChordConfig, ClickConfig};
use crate::error::Result;
use std::path::PathBuf;

/// Runtime settings for the analysis pipeline
#[derive(Debug, Clone)]
pub struct Settings {
    /// Input path (file or directory)
    pub input: PathBuf,
    /// Output directory
    pub output: PathBuf,
    pub chord: ChordConfig,
    pub beat: BeatConfig,
    pub click: ClickConfig,
    /// Number of analysis worker threads
    pub analysis_threads: usize,
    /// Scan recursively
    pub recursive: bool,
    /// Overwrite existing analysis
    pub force: bool,
    /// Show progress bars
    pub show_progress: bool,
    /// Dry run mode - show files without processing
    pub dry_run: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        let default_threads = num_cpus::get().saturating_sub(1).max(1);

        let mut chord = ChordConfig::default();
        chord.chroma.hop_length = cli.hop_length;
        chord.segment_duration = cli.segment_duration;
        chord.min_confidence = cli.min_confidence;

        let beat = BeatConfig {
            hop_length: cli.hop_length,
            start_bpm: cli.start_bpm,
            tightness: cli.tightness,
            ..BeatConfig::default()
        };

        let click = ClickConfig {
            click_frequency: cli.click_frequency,
            click_duration: cli.click_duration,
            ..ClickConfig::default()
        };

        Self {
            input: cli.input.clone(),
            output: cli.output.clone(),
            chord,
            beat,
            click,
            analysis_threads: cli.threads.unwrap_or(default_threads).max(1),
            recursive: cli.recursive,
            force: cli.force,
            show_progress: !cli.quiet,
            dry_run: cli.dry_run,
        }
    }

    /// Check every component's parameters
    pub fn validate(&self) -> Result<()> {
        self.chord.validate()?;
        self.beat.validate()?;
        self.click.validate()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: PathBuf::from("."),
            output: PathBuf::from("./output"),
            chord: ChordConfig::default(),
            beat: BeatConfig::default(),
            click: ClickConfig::default(),
            analysis_threads: num_cpus::get().saturating_sub(1).max(1),
            recursive: true,
            force: false,
            show_progress: true,
            dry_run: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use clap::Parser;

    #[test]
    fn test_from_cli_maps_component_configs() {
        let cli = Cli::parse_from([
            "cliqchord",
            "-i",
            "in",
            "-o",
            "out",
            "--hop-length",
            "1024",
            "--click-duration",
            "0.05",
            "-j",
            "3",
            "-q",
        ]);
        let settings = Settings::from_cli(&cli);
        assert_eq!(settings.chord.hop_length(), 1024);
        assert_eq!(settings.beat.hop_length, 1024);
        assert!((settings.click.click_duration - 0.05).abs() < 1e-12);
        assert_eq!(settings.analysis_threads, 3);
        assert!(!settings.show_progress);
        settings.validate().unwrap();
    }
}
