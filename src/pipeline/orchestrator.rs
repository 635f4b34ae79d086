//! Pipeline orchestration
//!
//! Coordinates file discovery, parallel per-file jobs, and the batch
//! summary. Each job decodes one file, detects chords and beats, renders
//! the click track, and writes the project's artifacts.

use crate::analysis::{
    BeatDetector, BeatTracker, ChordDetector, ClickTrackSynthesizer, TemplateChordDetector,
};
use crate::audio;
use crate::config::Settings;
use crate::discovery::{self, DiscoveredFile};
use crate::error::{CliqchordError, Result};
use crate::export::{self, SUMMARY_FILE_NAME};
use crate::types::ProjectAnalysis;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Chord timeline file name inside a project directory
pub const CHORDS_FILE_NAME: &str = "chords.json";
/// Click track file name inside a project directory
pub const CLICK_FILE_NAME: &str = "click.wav";

/// Pipeline result summary
#[derive(Debug)]
pub struct PipelineResult {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl PipelineResult {
    fn empty() -> Self {
        Self {
            total_files: 0,
            successful: 0,
            failed: 0,
            skipped: 0,
        }
    }
}

/// Run the full analysis pipeline
pub fn run(settings: &Settings) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();

    settings.validate()?;
    configure_thread_pool(settings.analysis_threads)?;

    // Phase 1: Discovery
    let discovery_start = Instant::now();
    info!("Scanning for audio files...");
    let files = discovery::scan(&settings.input, settings.recursive)?;

    if files.is_empty() {
        return Ok(PipelineResult::empty());
    }

    info!(
        "Found {} audio files in {:.2}s",
        files.len(),
        discovery_start.elapsed().as_secs_f64()
    );

    if settings.dry_run {
        return Ok(run_dry_run(&files, settings));
    }

    // Skip files already recorded in the summary
    let summary_path = settings.output.join(SUMMARY_FILE_NAME);
    let existing_paths = if settings.force {
        debug!("Force mode enabled, will re-analyze all files");
        HashSet::new()
    } else {
        export::read_existing_analysis(&summary_path)
    };

    let (files_to_analyze, skipped_existing): (Vec<_>, Vec<_>) = files.into_iter().partition(|f| {
        if existing_paths.contains(&*f.path.to_string_lossy()) {
            debug!("Skipping {} (already analyzed)", f.path.display());
            false
        } else {
            true
        }
    });

    let skipped_existing_count = skipped_existing.len();
    if skipped_existing_count > 0 {
        info!(
            "Skipping {} already-analyzed files (use --force to re-analyze)",
            skipped_existing_count
        );
    }

    let total_files = files_to_analyze.len() + skipped_existing_count;

    if files_to_analyze.is_empty() {
        info!("All files already analyzed, nothing to do");
        return Ok(PipelineResult {
            total_files,
            successful: 0,
            failed: 0,
            skipped: skipped_existing_count,
        });
    }

    std::fs::create_dir_all(&settings.output)
        .map_err(|e| CliqchordError::output_error(&settings.output, e))?;

    // Phase 2: Analysis
    info!("Analyzing {} files", files_to_analyze.len());
    let analysis_start = Instant::now();
    let (projects, stats) = analyze_files(&files_to_analyze, settings);
    let analysis_secs = analysis_start.elapsed().as_secs_f64();
    info!(
        "Analysis completed in {:.2}s ({:.1} files/sec)",
        analysis_secs,
        if analysis_secs > 0.0 {
            files_to_analyze.len() as f64 / analysis_secs
        } else {
            0.0
        }
    );

    // Phase 3: Summary
    if !projects.is_empty() {
        export_summary(projects, &summary_path)?;
    }

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(PipelineResult {
        total_files,
        successful: stats.successful,
        failed: stats.failed,
        skipped: stats.skipped + skipped_existing_count,
    })
}

/// Show the files and artifacts a run would produce
fn run_dry_run(files: &[DiscoveredFile], settings: &Settings) -> PipelineResult {
    println!();
    println!("=== DRY RUN MODE ===");
    println!();

    let mut by_directory: HashMap<PathBuf, Vec<&DiscoveredFile>> = HashMap::new();
    for file in files {
        let dir = file.path.parent().unwrap_or(&file.path).to_path_buf();
        by_directory.entry(dir).or_default().push(file);
    }

    let mut directories: Vec<_> = by_directory.keys().cloned().collect();
    directories.sort();

    for dir in &directories {
        let dir_files = &by_directory[dir];
        println!("{}/ ({} files)", dir.display(), dir_files.len());
        for file in dir_files {
            let filename = file
                .path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("?");
            println!(
                "  {} -> {}/",
                filename,
                discovery::generate_project_id(&file.path)
            );
        }
        println!();
    }

    println!("─────────────────────────────────────────");
    println!();
    println!("Would analyze {} files", files.len());
    println!();
    println!("Would create:");
    println!(
        "  {}/<project>/{} and {} per file",
        settings.output.display(),
        CHORDS_FILE_NAME,
        CLICK_FILE_NAME
    );
    println!("  {}/{}", settings.output.display(), SUMMARY_FILE_NAME);
    println!();

    PipelineResult {
        total_files: files.len(),
        successful: 0,
        failed: 0,
        skipped: files.len(),
    }
}

/// Configure the Rayon thread pool
fn configure_thread_pool(num_threads: usize) -> Result<()> {
    match rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads)
        .build_global()
    {
        Ok(()) => {
            debug!("Configured thread pool with {} threads", num_threads);
        }
        Err(e) => {
            // Already initialized, e.g. by an earlier run in the same process
            if e.to_string().contains("already been initialized") {
                debug!("Thread pool already initialized, using existing pool");
            } else {
                return Err(CliqchordError::ConfigError(format!(
                    "Failed to configure thread pool: {}",
                    e
                )));
            }
        }
    }
    Ok(())
}

struct AnalysisStats {
    successful: usize,
    failed: usize,
    skipped: usize,
}

/// Components shared by every job
struct Analyzers {
    chords: Arc<dyn ChordDetector>,
    beats: Arc<dyn BeatDetector>,
    click: ClickTrackSynthesizer,
}

impl Analyzers {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            chords: Arc::new(TemplateChordDetector::new(settings.chord.clone())),
            beats: Arc::new(BeatTracker::new(settings.beat.clone())),
            click: ClickTrackSynthesizer::new(settings.click.clone()),
        }
    }
}

/// Run one job per file in parallel
fn analyze_files(
    files: &[DiscoveredFile],
    settings: &Settings,
) -> (Vec<ProjectAnalysis>, AnalysisStats) {
    let analyzers = Analyzers::from_settings(settings);
    info!(
        "Using {} chord detection and {} beat tracking",
        analyzers.chords.name(),
        analyzers.beats.name()
    );

    let progress_bar = settings.show_progress.then(|| {
        let pb = ProgressBar::new(files.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb
    });

    let successful = AtomicUsize::new(0);
    let failed = AtomicUsize::new(0);
    let skipped = AtomicUsize::new(0);

    let projects: Vec<ProjectAnalysis> = files
        .par_iter()
        .filter_map(|file| {
            let result = analyze_single_file(file, &analyzers, &settings.output);

            if let Some(ref pb) = progress_bar {
                pb.inc(1);
                pb.set_message(file.path.file_name().unwrap_or_default().to_string_lossy().to_string());
            }

            match result {
                Ok(project) => {
                    successful.fetch_add(1, Ordering::Relaxed);
                    Some(project)
                }
                Err(e) if e.is_recoverable() => {
                    warn!("Skipping {}: {}", file.path.display(), e);
                    skipped.fetch_add(1, Ordering::Relaxed);
                    None
                }
                Err(e) => {
                    error!("Failed {}: {}", file.path.display(), e);
                    failed.fetch_add(1, Ordering::Relaxed);
                    None
                }
            }
        })
        .collect();

    if let Some(pb) = progress_bar {
        pb.finish_with_message("Analysis complete");
    }

    let stats = AnalysisStats {
        successful: successful.load(Ordering::Relaxed),
        failed: failed.load(Ordering::Relaxed),
        skipped: skipped.load(Ordering::Relaxed),
    };

    (projects, stats)
}

/// One project job: decode, detect, synthesize, write
fn analyze_single_file(
    file: &DiscoveredFile,
    analyzers: &Analyzers,
    output_dir: &Path,
) -> Result<ProjectAnalysis> {
    debug!("Analyzing: {}", file.path.display());

    let project_id = discovery::generate_project_id(&file.path);
    let buffer = audio::decode(&file.path)?;

    // Detection degrades instead of failing the job
    let chords = analyzers.chords.detect(&buffer);
    let estimate = analyzers.beats.detect(&buffer);

    let click = analyzers.click.synthesize(&buffer, Some(&estimate))?;

    let project_dir = output_dir.join(&project_id);
    let chords_path = export::save_chords(&chords, &project_dir.join(CHORDS_FILE_NAME))?;
    let click_path = export::write_click_wav(&click, &project_dir.join(CLICK_FILE_NAME))?;

    debug!(
        "Analyzed {}: {} BPM, {} beats, {} chords",
        file.path.file_name().unwrap_or_default().to_string_lossy(),
        estimate.bpm,
        estimate.beat_times.len(),
        chords.len()
    );

    Ok(ProjectAnalysis {
        project_id,
        path: file.path.clone(),
        duration_seconds: buffer.duration,
        bpm: estimate.bpm,
        beat_count: estimate.beat_times.len(),
        chord_count: chords.len(),
        chords_path,
        click_path,
        analyzed_at: chrono::Utc::now(),
    })
}

/// Write the summary, keeping earlier records for files not re-analyzed
fn export_summary(mut projects: Vec<ProjectAnalysis>, summary_path: &Path) -> Result<()> {
    let analyzed: HashSet<PathBuf> = projects.iter().map(|p| p.path.clone()).collect();
    let preserved: Vec<ProjectAnalysis> = export::read_existing_projects(summary_path)
        .into_iter()
        .filter(|p| !analyzed.contains(&p.path))
        .collect();

    if !preserved.is_empty() {
        debug!("Preserving {} earlier project records", preserved.len());
    }

    let new_count = projects.len();
    projects.extend(preserved);
    projects.sort_by(|a, b| a.path.cmp(&b.path));

    export::write_summary(&projects, summary_path)?;

    println!();
    println!(
        "✓ Wrote {} new projects ({} total) to {}",
        new_count,
        projects.len(),
        summary_path.display()
    );
    println!();

    Ok(())
}
