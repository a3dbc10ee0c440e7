//! Input file discovery.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions accepted by the loudness normalizer.
pub const MKV_EXTENSIONS: &[&str] = &["mkv"];

/// Extensions accepted by the video converter.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "mov", "avi", "webm"];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("Input not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{} is neither a directory nor a {} file", path.display(), expected.join("/"))]
    Unsupported {
        path: PathBuf,
        expected: Vec<String>,
    },

    #[error("Failed to list {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Returns true if `path` has one of `extensions` (case-insensitive).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}

/// Lists the files a batch should process.
///
/// A directory is scanned non-recursively and the result sorted by path. A
/// single file is accepted as-is if its extension matches.
pub fn find_files(input: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>, DiscoveryError> {
    if input.is_dir() {
        let entries = std::fs::read_dir(input).map_err(|source| DiscoveryError::Io {
            path: input.to_path_buf(),
            source,
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| DiscoveryError::Io {
                path: input.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && has_extension(&path, extensions) {
                files.push(path);
            }
        }
        files.sort();
        return Ok(files);
    }

    if !input.exists() {
        return Err(DiscoveryError::NotFound {
            path: input.to_path_buf(),
        });
    }

    if has_extension(input, extensions) {
        Ok(vec![input.to_path_buf()])
    } else {
        Err(DiscoveryError::Unsupported {
            path: input.to_path_buf(),
            expected: extensions.iter().map(|e| format!(".{}", e)).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directory_scan_is_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mkv", "a.MKV", "notes.txt", "c.mp4"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mkv")).unwrap();

        let files = find_files(dir.path(), MKV_EXTENSIONS).unwrap();
        assert_eq!(
            files,
            vec![dir.path().join("a.MKV"), dir.path().join("b.mkv")]
        );
    }

    #[test]
    fn test_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("movie.mkv");
        std::fs::write(&file, b"").unwrap();

        assert_eq!(find_files(&file, MKV_EXTENSIONS).unwrap(), vec![file]);
    }

    #[test]
    fn test_wrong_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("movie.avi");
        std::fs::write(&file, b"").unwrap();

        let err = find_files(&file, MKV_EXTENSIONS).unwrap_err();
        assert!(matches!(err, DiscoveryError::Unsupported { .. }));
        assert!(err.to_string().contains(".mkv"));
    }

    #[test]
    fn test_missing_input() {
        let err = find_files(Path::new("/nonexistent/input"), VIDEO_EXTENSIONS).unwrap_err();
        assert!(matches!(err, DiscoveryError::NotFound { .. }));
    }
}
