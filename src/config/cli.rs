//! CLI argument parsing and configuration

use clap::Parser;
use std::path::PathBuf;

/// cliqchord - Chord timelines and click tracks for practice sessions
///
/// Analyzes audio files to detect chords and beats, then writes a chord
/// timeline (chords.json) and a synchronized click track (click.wav) per file.
#[derive(Parser, Debug)]
#[command(name = "cliqchord")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Input path (file or directory)
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output directory (one sub-directory per analyzed file)
    #[arg(short, long, value_name = "DIR")]
    pub output: PathBuf,

    /// Chroma hop length in samples
    #[arg(long, value_name = "SAMPLES", default_value_t = 512)]
    pub hop_length: usize,

    /// Chord segment length in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 1.0)]
    pub segment_duration: f64,

    /// Minimum confidence for a chord segment to be kept (0-1)
    #[arg(long, value_name = "SCORE", default_value_t = 0.65)]
    pub min_confidence: f64,

    /// Tempo prior for beat tracking
    #[arg(long, value_name = "BPM", default_value_t = 120.0)]
    pub start_bpm: f64,

    /// Beat spacing regularity (higher = more even beats)
    #[arg(long, value_name = "N", default_value_t = 100.0)]
    pub tightness: f64,

    /// Frequency of regular beat clicks in Hz (downbeats use a lower accent tone)
    #[arg(long, value_name = "HZ", default_value_t = 1400.0)]
    pub click_frequency: f64,

    /// Length of each click in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = 0.03)]
    pub click_duration: f64,

    /// Number of worker threads (defaults to CPU count - 1)
    #[arg(short = 'j', long, value_name = "N")]
    pub threads: Option<usize>,

    /// Only scan the top level of the input directory
    #[arg(long = "no-recursive", action = clap::ArgAction::SetFalse)]
    pub recursive: bool,

    /// Overwrite existing analysis (by default, skips already-analyzed files)
    #[arg(long, default_value = "false")]
    pub force: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress bars)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Dry run - show files that would be analyzed without processing
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

impl Cli {
    /// Default log filter based on verbosity flags
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}
