//! Audio file discovery and project identity

use crate::error::{CliqchordError, Result};
use crate::types::AudioFormat;
use hash32::FnvHasher;
use std::hash::Hasher;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Audio file found on disk
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    pub path: PathBuf,
    pub format: AudioFormat,
    pub size_bytes: u64,
}

/// Scan a file or directory for supported audio files, sorted by path
pub fn scan(input: &Path, recursive: bool) -> Result<Vec<DiscoveredFile>> {
    if !input.exists() {
        return Err(CliqchordError::FileNotFound(input.to_path_buf()));
    }

    let mut files = Vec::new();

    if input.is_file() {
        match try_discover_file(input) {
            Some(file) => files.push(file),
            None => {
                return Err(CliqchordError::UnsupportedFormat {
                    path: input.to_path_buf(),
                    format: input
                        .extension()
                        .and_then(|e| e.to_str())
                        .unwrap_or("unknown")
                        .to_string(),
                })
            }
        }
    } else if input.is_dir() {
        let max_depth = if recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(input)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let path = entry.path();
            if path.is_file() {
                if let Some(file) = try_discover_file(path) {
                    debug!("Discovered: {}", file.path.display());
                    files.push(file);
                }
            }
        }
    }

    info!("Discovered {} audio files", files.len());
    if files.is_empty() {
        warn!("No supported audio files found in {}", input.display());
    }

    Ok(files)
}

fn try_discover_file(path: &Path) -> Option<DiscoveredFile> {
    let ext = path.extension()?.to_str()?;
    let format = AudioFormat::from_extension(ext)?;
    let size_bytes = std::fs::metadata(path).ok()?.len();

    Some(DiscoveredFile {
        path: path.to_path_buf(),
        format,
        size_bytes,
    })
}

/// Deterministic project ID for a source file: FNV-1a of the normalized
/// path as eight hex digits
///
/// The ID names the per-file output directory, so re-running on the same
/// file overwrites the same artifacts.
pub fn generate_project_id(path: &Path) -> String {
    use hash32::Hasher as Hash32Hasher;

    let mut hasher = FnvHasher::default();
    hasher.write(normalize_path_for_hash(path).as_bytes());
    format!("{:08x}", hasher.finish32())
}

/// Forward slashes and lowercase, so the same file hashes alike on every
/// platform
fn normalize_path_for_hash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/").to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_project_id_deterministic_hex() {
        let path = Path::new("/Users/band/demos/take3.wav");
        let id = generate_project_id(path);
        assert_eq!(id, generate_project_id(path));
        assert_eq!(id.len(), 8);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_project_id(Path::new("/Users/band/demos/take4.wav")));
    }

    #[test]
    fn test_path_normalization() {
        let win = normalize_path_for_hash(Path::new("C:\\Music\\Song.mp3"));
        let unix = normalize_path_for_hash(Path::new("c:/music/song.mp3"));
        assert_eq!(win, unix);
    }

    #[test]
    fn test_scan_filters_and_recursion() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.wav"), b"").unwrap();
        std::fs::write(temp.path().join("notes.txt"), b"").unwrap();
        std::fs::create_dir(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("sub/b.FLAC"), b"").unwrap();

        let flat = scan(temp.path(), false).unwrap();
        assert_eq!(flat.len(), 1);
        assert_eq!(flat[0].format, AudioFormat::Wav);

        let deep = scan(temp.path(), true).unwrap();
        assert_eq!(deep.len(), 2);
    }

    #[test]
    fn test_scan_single_unsupported_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("cover.jpg");
        std::fs::write(&path, b"").unwrap();
        assert!(matches!(
            scan(&path, true),
            Err(CliqchordError::UnsupportedFormat { .. })
        ));
        assert!(matches!(
            scan(&temp.path().join("missing.wav"), true),
            Err(CliqchordError::FileNotFound(_))
        ));
    }
}
