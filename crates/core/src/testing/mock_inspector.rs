//! Mock inspector for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

use crate::probe::{AudioInspector, AudioTrack, ProbeError};

/// Mock implementation of the AudioInspector trait.
///
/// Provides controllable behavior for testing:
/// - Per-path track lists
/// - A default track list for unknown paths
/// - Per-path probe failures
#[derive(Debug, Clone, Default)]
pub struct MockInspector {
    tracks: Arc<RwLock<HashMap<PathBuf, Vec<AudioTrack>>>>,
    failures: Arc<RwLock<HashMap<PathBuf, String>>>,
    default_tracks: Arc<RwLock<Vec<AudioTrack>>>,
    calls: Arc<AtomicUsize>,
}

impl MockInspector {
    /// Create a new mock inspector. Unknown files have no audio tracks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tracks reported for a specific path.
    pub fn set_tracks(&self, path: impl AsRef<Path>, tracks: Vec<AudioTrack>) {
        self.tracks
            .write()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), tracks);
    }

    /// Set the tracks reported for paths without an explicit entry.
    pub fn set_default_tracks(&self, tracks: Vec<AudioTrack>) {
        *self.default_tracks.write().unwrap() = tracks;
    }

    /// Make probing `path` fail as if ffprobe exited with code 1.
    pub fn fail_for(&self, path: impl AsRef<Path>, stderr: impl Into<String>) {
        self.failures
            .write()
            .unwrap()
            .insert(path.as_ref().to_path_buf(), stderr.into());
    }

    /// Number of probes performed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AudioInspector for MockInspector {
    fn name(&self) -> &str {
        "mock"
    }

    async fn audio_tracks(&self, path: &Path) -> Result<Vec<AudioTrack>, ProbeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(stderr) = self.failures.read().unwrap().get(path) {
            return Err(ProbeError::ProbeFailed {
                code: Some(1),
                stderr: stderr.clone(),
            });
        }

        Ok(self
            .tracks
            .read()
            .unwrap()
            .get(path)
            .cloned()
            .unwrap_or_else(|| self.default_tracks.read().unwrap().clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_inspector_tracks() {
        let inspector = MockInspector::new();
        inspector.set_tracks("/in/a.mkv", vec![AudioTrack::new(1, "aac")]);
        inspector.fail_for("/in/b.mkv", "Invalid data");

        let tracks = tokio_test::block_on(inspector.audio_tracks(Path::new("/in/a.mkv"))).unwrap();
        assert_eq!(tracks.len(), 1);

        let err = tokio_test::block_on(inspector.audio_tracks(Path::new("/in/b.mkv"))).unwrap_err();
        assert!(matches!(err, ProbeError::ProbeFailed { .. }));

        let none = tokio_test::block_on(inspector.audio_tracks(Path::new("/in/c.mkv"))).unwrap();
        assert!(none.is_empty());
        assert_eq!(inspector.call_count(), 3);
    }
}
