//! Integration tests for the cliqchord pipeline
//!
//! These tests run the full pipeline on generated WAV files and check the
//! artifacts it leaves on disk.

use cliqchord::export::{load_chords, SUMMARY_FILE_NAME};
use cliqchord::pipeline::{self, CHORDS_FILE_NAME, CLICK_FILE_NAME};
use cliqchord::{config::Settings, CliqchordError};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write mono 16-bit samples to a WAV file
fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec).expect("Failed to create WAV file");
    for &sample in samples {
        writer
            .write_sample((sample * 32767.0) as i16)
            .expect("Failed to write sample");
    }
    writer.finalize().expect("Failed to finalize WAV");
}

/// Generate a sustained chord as a sum of sines
fn generate_chord_wav(path: &Path, frequencies: &[f32], duration_secs: f32, sample_rate: u32) {
    use std::f32::consts::PI;

    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let amplitude = 0.6 / frequencies.len() as f32;
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            frequencies
                .iter()
                .map(|f| (2.0 * PI * f * t).sin() * amplitude)
                .sum()
        })
        .collect();

    write_wav(path, &samples, sample_rate);
}

/// Generate a click track of decaying noise bursts at the given tempo
///
/// Broadband bursts give every mel band an onset, which a median-aggregated
/// onset envelope needs.
fn generate_click_track(path: &Path, bpm: f32, duration_secs: f32, sample_rate: u32) {
    let num_samples = (duration_secs * sample_rate as f32) as usize;
    let samples_per_beat = (60.0 / bpm * sample_rate as f32) as usize;
    let burst_samples = (0.02 * sample_rate as f32) as usize;

    let mut state = 0x9e37_79b9u32;
    let samples: Vec<f32> = (0..num_samples)
        .map(|i| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let position_in_beat = i % samples_per_beat;
            if position_in_beat < burst_samples {
                let noise = state as f32 / u32::MAX as f32 * 2.0 - 1.0;
                let decay = (-6.0 * position_in_beat as f32 / burst_samples as f32).exp();
                0.8 * noise * decay
            } else {
                0.0
            }
        })
        .collect();

    write_wav(path, &samples, sample_rate);
}

/// Create test settings with progress bars disabled
fn create_test_settings(input: &Path, output: &Path) -> Settings {
    Settings {
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        analysis_threads: 2,
        recursive: true,
        force: false,
        show_progress: false,
        dry_run: false,
        ..Settings::default()
    }
}

/// Parsed `cliqchord.json`
fn read_summary(output_dir: &Path) -> serde_json::Value {
    let text = fs::read_to_string(output_dir.join(SUMMARY_FILE_NAME)).expect("Failed to read summary");
    serde_json::from_str(&text).expect("Summary should be valid JSON")
}

fn project_dirs(output_dir: &Path) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(output_dir)
        .expect("Output directory should exist")
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_dir())
        .collect();
    dirs.sort();
    dirs
}

/// Accepts the target tempo or its half/double
fn is_bpm_match(detected: f64, target: f64, tolerance: f64) -> bool {
    [1.0, 0.5, 2.0]
        .iter()
        .any(|m| (detected - target * m).abs() <= tolerance)
}

#[test]
fn test_pipeline_writes_project_artifacts() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    // 44.1 kHz source exercises resampling to the analysis rate
    let test_wav = input_dir.path().join("c_major.wav");
    generate_chord_wav(&test_wav, &[261.63, 329.63, 392.0], 5.0, 44100);

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    let result = pipeline::run(&settings).expect("Pipeline should succeed");

    assert_eq!(result.total_files, 1, "Should find 1 file");
    assert_eq!(result.successful, 1, "Should successfully analyze 1 file");
    assert_eq!(result.failed, 0, "Should have no failures");

    let summary = read_summary(output_dir.path());
    assert_eq!(summary["version"], "1.0");
    assert_eq!(summary["metadata"]["project_count"], 1);
    let project = &summary["projects"][0];
    let project_id = project["project_id"].as_str().expect("project_id should be a string");
    assert_eq!(project_id.len(), 8);

    let project_dir = output_dir.path().join(project_id);
    assert!(project_dir.join(CHORDS_FILE_NAME).exists(), "chords.json should exist");
    assert!(project_dir.join(CLICK_FILE_NAME).exists(), "click.wav should exist");

    let bpm = project["bpm"].as_f64().expect("bpm should be a number");
    assert!((60.0..=200.0).contains(&bpm), "BPM {} outside corrected range", bpm);

    let reader = hound::WavReader::open(project_dir.join(CLICK_FILE_NAME)).expect("click.wav should be readable");
    let spec = reader.spec();
    assert_eq!(spec.channels, 2, "Click track should be stereo");
    assert_eq!(spec.sample_rate, 44100);
    assert_eq!(spec.bits_per_sample, 16);
    let frames = reader.duration() as i64;
    assert!(
        (frames - 5 * 44100).abs() < 2205,
        "Click track should last about 5s, got {} frames",
        frames
    );
}

#[test]
fn test_c_major_chord_detected() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    generate_chord_wav(
        &input_dir.path().join("chord.wav"),
        &[261.63, 329.63, 392.0],
        6.0,
        22050,
    );

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    pipeline::run(&settings).expect("Pipeline should succeed");

    let dirs = project_dirs(output_dir.path());
    assert_eq!(dirs.len(), 1);
    let chords = load_chords(&dirs[0].join(CHORDS_FILE_NAME)).expect("chords.json should load");

    assert_eq!(chords.len(), 1, "Expected a single merged chord, got {:?}", chords);
    assert_eq!(chords[0].chord_label, "C");
    assert!(chords[0].confidence > 0.65 && chords[0].confidence <= 1.0);
    assert!(
        (chords[0].duration_seconds - 6.0).abs() < 0.1,
        "Chord should span the whole file, got {}",
        chords[0].duration_seconds
    );

    // Serialized with the short keys
    let raw = fs::read_to_string(dirs[0].join(CHORDS_FILE_NAME)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["chord"], "C");
    assert!(value[0].get("time").is_some());
    assert!(value[0].get("duration").is_some());
}

#[test]
fn test_tempo_of_120_click_track() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    generate_click_track(&input_dir.path().join("click_120.wav"), 120.0, 12.0, 22050);

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    pipeline::run(&settings).expect("Pipeline should succeed");

    let summary = read_summary(output_dir.path());
    let project = &summary["projects"][0];
    let bpm = project["bpm"].as_f64().unwrap();
    assert!(
        is_bpm_match(bpm, 120.0, 3.0),
        "Expected 120 BPM or an octave of it, got {}",
        bpm
    );
    assert!(
        project["beat_count"].as_u64().unwrap() >= 5,
        "A steady click should yield beats"
    );
}

#[test]
fn test_tempo_away_from_prior() {
    for target in [90.0f32, 140.0] {
        let input_dir = TempDir::new().expect("Failed to create input temp dir");
        let output_dir = TempDir::new().expect("Failed to create output temp dir");

        generate_click_track(&input_dir.path().join("click.wav"), target, 20.0, 22050);

        let settings = create_test_settings(input_dir.path(), output_dir.path());
        pipeline::run(&settings).expect("Pipeline should succeed");

        let summary = read_summary(output_dir.path());
        let bpm = summary["projects"][0]["bpm"].as_f64().unwrap();
        assert!(
            (bpm - target as f64).abs() <= 3.0,
            "Expected {} BPM without octave error, got {}",
            target,
            bpm
        );
    }
}

#[test]
fn test_resampled_source_keeps_click_timing() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");

    // One impulse at exactly 1.0s in a 44.1 kHz file
    let mut samples = vec![0.0f32; 44100 * 3];
    samples[44100] = 0.9;
    let path = input_dir.path().join("impulse_44k.wav");
    write_wav(&path, &samples, 44100);

    let buffer = cliqchord::audio::decode(&path).expect("Decode should succeed");
    assert_eq!(buffer.sample_rate, 22050);
    let peak = buffer
        .samples
        .iter()
        .enumerate()
        .fold(0, |best, (i, v)| if v.abs() > buffer.samples[best].abs() { i } else { best });
    assert!(
        (peak as i64 - 22050).abs() <= 1,
        "Impulse should stay at 1.0s, found at {:.4}s",
        peak as f64 / 22050.0
    );
}

#[test]
fn test_silent_file_gets_fallback_click() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    write_wav(&input_dir.path().join("silence.wav"), &vec![0.0; 22050 * 4], 22050);

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    let result = pipeline::run(&settings).expect("Pipeline should succeed");
    assert_eq!(result.successful, 1);

    let summary = read_summary(output_dir.path());
    let project = &summary["projects"][0];
    assert_eq!(project["bpm"].as_f64(), Some(120.0));
    assert_eq!(project["beat_count"].as_u64(), Some(0));
    assert_eq!(project["chord_count"].as_u64(), Some(0));

    let dirs = project_dirs(output_dir.path());
    let reader = hound::WavReader::open(dirs[0].join(CLICK_FILE_NAME)).unwrap();
    assert_eq!(reader.duration(), 4 * 44100);
}

#[test]
fn test_skip_existing_and_force() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    generate_chord_wav(&input_dir.path().join("a.wav"), &[220.0, 277.18, 329.63], 3.0, 22050);

    let mut settings = create_test_settings(input_dir.path(), output_dir.path());
    let first = pipeline::run(&settings).expect("First run should succeed");
    assert_eq!(first.successful, 1);

    let second = pipeline::run(&settings).expect("Second run should succeed");
    assert_eq!(second.successful, 0, "Already-analyzed file should not be re-run");
    assert_eq!(second.skipped, 1);

    settings.force = true;
    let forced = pipeline::run(&settings).expect("Forced run should succeed");
    assert_eq!(forced.successful, 1, "--force should re-analyze");

    let summary = read_summary(output_dir.path());
    assert_eq!(summary["projects"].as_array().unwrap().len(), 1);
}

#[test]
fn test_summary_preserves_skipped_projects() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    generate_chord_wav(&input_dir.path().join("one.wav"), &[261.63, 329.63, 392.0], 3.0, 22050);
    generate_chord_wav(&input_dir.path().join("two.wav"), &[196.0, 246.94, 293.66], 3.0, 22050);

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    let first = pipeline::run(&settings).expect("First run should succeed");
    assert_eq!(first.successful, 2);

    generate_chord_wav(&input_dir.path().join("three.wav"), &[220.0, 261.63, 329.63], 3.0, 22050);
    let second = pipeline::run(&settings).expect("Second run should succeed");
    assert_eq!(second.total_files, 3);
    assert_eq!(second.successful, 1);
    assert_eq!(second.skipped, 2);

    let summary = read_summary(output_dir.path());
    assert_eq!(
        summary["projects"].as_array().unwrap().len(),
        3,
        "Earlier projects should be kept in the summary"
    );
    assert_eq!(project_dirs(output_dir.path()).len(), 3);
}

#[test]
fn test_pipeline_handles_empty_directory() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    let result = pipeline::run(&settings).expect("Pipeline should succeed on empty dir");

    assert_eq!(result.total_files, 0);
    assert_eq!(result.successful, 0);
    assert!(!output_dir.path().join(SUMMARY_FILE_NAME).exists());
}

#[test]
fn test_pipeline_multiple_files() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    let nested = input_dir.path().join("set/two");
    fs::create_dir_all(&nested).unwrap();
    generate_chord_wav(&input_dir.path().join("a.wav"), &[261.63, 329.63, 392.0], 3.0, 22050);
    generate_click_track(&nested.join("b.wav"), 100.0, 4.0, 22050);
    fs::write(input_dir.path().join("readme.txt"), "not audio").unwrap();

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    let result = pipeline::run(&settings).expect("Pipeline should succeed");

    assert_eq!(result.total_files, 2, "Text files are not discovered");
    assert_eq!(result.successful, 2);
    assert_eq!(project_dirs(output_dir.path()).len(), 2);

    let flat = Settings {
        recursive: false,
        force: true,
        ..create_test_settings(input_dir.path(), output_dir.path())
    };
    let result = pipeline::run(&flat).expect("Non-recursive run should succeed");
    assert_eq!(result.total_files, 1);
}

#[test]
fn test_handles_empty_audio_file() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    fs::write(input_dir.path().join("empty.wav"), b"").expect("Failed to create empty file");

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    let result = pipeline::run(&settings).expect("Pipeline should not abort on a bad file");

    assert_eq!(result.total_files, 1);
    assert_eq!(result.skipped, 1, "Undecodable file is skipped");
    assert_eq!(result.failed, 0);
    assert!(project_dirs(output_dir.path()).is_empty());
}

#[test]
fn test_handles_invalid_audio_data() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    fs::write(
        input_dir.path().join("garbage.mp3"),
        b"this is definitely not an mp3 stream".repeat(64),
    )
    .unwrap();
    generate_chord_wav(&input_dir.path().join("good.wav"), &[261.63, 329.63, 392.0], 3.0, 22050);

    let settings = create_test_settings(input_dir.path(), output_dir.path());
    let result = pipeline::run(&settings).expect("Pipeline should continue past bad data");

    assert_eq!(result.total_files, 2);
    assert_eq!(result.successful, 1, "The valid file is still analyzed");
    assert_eq!(result.failed, 0);
}

#[test]
fn test_handles_nonexistent_input_gracefully() {
    let output_dir = TempDir::new().expect("Failed to create output temp dir");
    let missing = output_dir.path().join("does/not/exist");

    let settings = create_test_settings(&missing, output_dir.path());
    let err = pipeline::run(&settings).expect_err("Missing input should be an error");
    assert!(matches!(err, CliqchordError::FileNotFound(_)));
}

#[test]
fn test_dry_run_writes_nothing() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    generate_chord_wav(&input_dir.path().join("a.wav"), &[261.63, 329.63, 392.0], 2.0, 22050);

    let settings = Settings {
        dry_run: true,
        ..create_test_settings(input_dir.path(), output_dir.path())
    };
    let result = pipeline::run(&settings).expect("Dry run should succeed");

    assert_eq!(result.total_files, 1);
    assert_eq!(result.successful, 0);
    assert_eq!(result.skipped, 1);
    assert!(!output_dir.path().join(SUMMARY_FILE_NAME).exists());
    assert!(project_dirs(output_dir.path()).is_empty());
}

#[test]
fn test_invalid_settings_are_rejected() {
    let input_dir = TempDir::new().expect("Failed to create input temp dir");
    let output_dir = TempDir::new().expect("Failed to create output temp dir");

    let mut settings = create_test_settings(input_dir.path(), output_dir.path());
    settings.chord.min_confidence = 2.0;

    let err = pipeline::run(&settings).expect_err("Invalid settings should abort the batch");
    assert!(matches!(err, CliqchordError::ConfigError(_)));
    assert!(!err.is_recoverable());

    // A tempo prior outside 60-200 would leak into silent files' BPM
    let mut settings = create_test_settings(input_dir.path(), output_dir.path());
    settings.beat.start_bpm = 500.0;
    let err = pipeline::run(&settings).expect_err("Out-of-range tempo prior should be rejected");
    assert!(matches!(err, CliqchordError::ConfigError(_)));
}
