//! JSON persistence for chord timelines and the batch summary

use crate::error::{CliqchordError, Result};
use crate::types::{ChordEvent, ProjectAnalysis};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Summary schema version
const SCHEMA_VERSION: &str = "1.0";

/// File name of the batch summary inside the output directory
pub const SUMMARY_FILE_NAME: &str = "cliqchord.json";

/// Top-level batch summary
#[derive(Debug, Serialize, Deserialize)]
pub struct CliqchordSummary {
    /// Schema version for forward compatibility
    pub version: String,
    pub metadata: SummaryMetadata,
    pub projects: Vec<ProjectAnalysis>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryMetadata {
    /// cliqchord version that generated this file
    pub generator_version: String,
    pub exported_at: String,
    pub project_count: usize,
}

/// Serialize `value` as pretty JSON via a temp file and rename, so readers
/// never see a partial file
fn write_json_atomic<T: Serialize + ?Sized>(value: &T, output_path: &Path) -> Result<()> {
    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| CliqchordError::output_error(output_path, e))?;
        }
    }

    let temp_path = output_path.with_extension("json.tmp");

    let file = File::create(&temp_path).map_err(|e| CliqchordError::OutputError {
        path: output_path.to_path_buf(),
        reason: format!("Failed to create temp file: {}", e),
    })?;

    write_json(value, &file)
        .and_then(|_| file.sync_all())
        .map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            CliqchordError::OutputError {
                path: output_path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

    std::fs::rename(&temp_path, output_path).map_err(|e| {
        let _ = std::fs::remove_file(&temp_path);
        CliqchordError::OutputError {
            path: output_path.to_path_buf(),
            reason: format!("Failed to finalize file: {}", e),
        }
    })?;

    Ok(())
}

/// Pretty-print `value` into `writer`, surfacing the final flush error
fn write_json<T: Serialize + ?Sized, W: Write>(value: &T, writer: W) -> std::io::Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()
}

/// Write a chord timeline as a JSON array, returning the written path
pub fn save_chords(events: &[ChordEvent], output_path: &Path) -> Result<PathBuf> {
    write_json_atomic(events, output_path)?;
    debug!("Wrote {} chord events to {}", events.len(), output_path.display());
    Ok(output_path.to_path_buf())
}

/// Read a chord timeline written by [`save_chords`]
pub fn load_chords(path: &Path) -> Result<Vec<ChordEvent>> {
    if !path.exists() {
        return Err(CliqchordError::FileNotFound(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    let events = serde_json::from_reader(reader).map_err(std::io::Error::from)?;
    Ok(events)
}

/// Write the batch summary
pub fn write_summary(projects: &[ProjectAnalysis], output_path: &Path) -> Result<()> {
    let summary = CliqchordSummary {
        version: SCHEMA_VERSION.to_string(),
        metadata: SummaryMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            project_count: projects.len(),
        },
        projects: projects.to_vec(),
    };

    write_json_atomic(&summary, output_path)?;
    info!("Wrote {} projects to {}", projects.len(), output_path.display());
    Ok(())
}

fn read_summary(json_path: &Path) -> Option<CliqchordSummary> {
    if !json_path.exists() {
        debug!("No existing summary at {}", json_path.display());
        return None;
    }

    let file = match File::open(json_path) {
        Ok(f) => f,
        Err(e) => {
            debug!("Could not open existing summary: {}", e);
            return None;
        }
    };

    match serde_json::from_reader(BufReader::new(file)) {
        Ok(summary) => Some(summary),
        Err(e) => {
            debug!("Could not parse existing summary: {}", e);
            None
        }
    }
}

/// Source paths already present in an existing summary
///
/// A missing or unreadable summary yields an empty set.
pub fn read_existing_analysis(json_path: &Path) -> HashSet<String> {
    let paths: HashSet<String> = read_existing_projects(json_path)
        .iter()
        .map(|p| p.path.to_string_lossy().to_string())
        .collect();

    if !paths.is_empty() {
        debug!(
            "Loaded {} previously analyzed files from {}",
            paths.len(),
            json_path.display()
        );
    }
    paths
}

/// Full project records from an existing summary, preserved across runs
pub fn read_existing_projects(json_path: &Path) -> Vec<ProjectAnalysis> {
    read_summary(json_path).map(|s| s.projects).unwrap_or_default()
}
