//! Unified error types for cliqchord
//!
//! Error strategy:
//! - Per-file errors (decode, detection): Recoverable, skip and continue
//! - Synthesis and output errors: Fatal for the job, the file is reported as failed
//! - Configuration errors: Fatal, abort batch
//!
//! Chord and beat detection swallow their own `AnalysisError`s and degrade to
//! an empty chord list or the default beat estimate. Click synthesis never does.

use std::path::PathBuf;
use thiserror::Error;

/// Supported audio formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, FLAC, AIFF";

/// Top-level error type for cliqchord operations
#[derive(Debug, Error)]
pub enum CliqchordError {
    // =========================================================================
    // Recoverable errors - skip file, continue batch
    // =========================================================================
    #[error("Failed to decode audio file '{path}': {reason}\n  Supported formats: {SUPPORTED_FORMATS}\n  Tip: If the file plays in other apps, it may be corrupted or use an unsupported codec")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Unsupported audio format for '{path}': {format}\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { path: PathBuf, format: String },

    #[error("{stage} analysis failed: {reason}")]
    AnalysisError { stage: &'static str, reason: String },

    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Job-fatal errors - the click artifact is part of the job contract
    // =========================================================================
    #[error("Click track synthesis failed: {reason}")]
    SynthesisError { reason: String },

    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    // =========================================================================
    // Fatal errors - abort entire batch
    // =========================================================================
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cliqchord operations
pub type Result<T> = std::result::Result<T, CliqchordError>;

impl CliqchordError {
    /// Returns true if this error is recoverable (should skip file, continue batch)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CliqchordError::DecodeError { .. }
                | CliqchordError::UnsupportedFormat { .. }
                | CliqchordError::AnalysisError { .. }
                | CliqchordError::FileNotFound(_)
        )
    }

    /// Create a decode error with context about the issue
    pub fn decode_error(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        CliqchordError::DecodeError {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an analysis error for the named detection stage
    pub fn analysis(stage: &'static str, reason: impl Into<String>) -> Self {
        CliqchordError::AnalysisError {
            stage,
            reason: reason.into(),
        }
    }

    /// Create a synthesis error
    pub fn synthesis(reason: impl Into<String>) -> Self {
        CliqchordError::SynthesisError {
            reason: reason.into(),
        }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            _ => err.to_string(),
        };
        CliqchordError::OutputError { path, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_errors_are_recoverable() {
        assert!(CliqchordError::analysis("chord", "empty chromagram").is_recoverable());
        assert!(CliqchordError::decode_error("/a.wav", "bad header").is_recoverable());
        assert!(CliqchordError::FileNotFound(PathBuf::from("/missing.mp3")).is_recoverable());
    }

    #[test]
    fn test_synthesis_and_output_errors_are_fatal() {
        assert!(!CliqchordError::synthesis("duration is zero").is_recoverable());
        let err = CliqchordError::output_error(
            "/readonly/click.wav",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("Permission denied"));
    }
}
