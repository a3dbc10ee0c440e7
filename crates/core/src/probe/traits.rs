//! Trait definitions for the probe module.

use async_trait::async_trait;
use std::path::Path;

use super::error::ProbeError;
use super::types::AudioTrack;

/// Something that can list the audio tracks of a media file.
#[async_trait]
pub trait AudioInspector: Send + Sync {
    /// Returns the name of this inspector implementation.
    fn name(&self) -> &str;

    /// Lists the audio tracks of `path` in stream order.
    ///
    /// The file is only read, so calling this repeatedly for the same file
    /// yields the same tracks.
    async fn audio_tracks(&self, path: &Path) -> Result<Vec<AudioTrack>, ProbeError>;
}
