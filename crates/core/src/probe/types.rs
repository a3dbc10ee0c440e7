//! Types for the probe module.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tag keys that may carry a track title, in lookup order.
///
/// `title` is what ffprobe reports for most containers; Matroska files muxed
/// by older tools expose `TITLE`, and very old ffprobe builds flattened tags
/// as `TAG:title`.
pub const TITLE_KEYS: [&str; 3] = ["title", "TAG:title", "TITLE"];

/// One audio stream of a media file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioTrack {
    /// Stream index within the container.
    pub index: u32,
    /// Codec name as reported by ffprobe (e.g. "aac", "dts").
    pub codec_name: Option<String>,
    /// Stream tags.
    pub tags: BTreeMap<String, String>,
}

impl AudioTrack {
    /// Creates a track without tags.
    pub fn new(index: u32, codec_name: impl Into<String>) -> Self {
        Self {
            index,
            codec_name: Some(codec_name.into()),
            tags: BTreeMap::new(),
        }
    }

    /// Adds a tag.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Returns the first non-empty title found under [`TITLE_KEYS`].
    pub fn title(&self) -> Option<&str> {
        TITLE_KEYS
            .iter()
            .filter_map(|key| self.tags.get(*key))
            .map(|value| value.as_str())
            .find(|value| !value.trim().is_empty())
    }

    /// Language tag, if present.
    pub fn language(&self) -> Option<&str> {
        self.tags.get("language").map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_precedence() {
        let track = AudioTrack::new(1, "aac")
            .with_tag("TITLE", "legacy")
            .with_tag("title", "primary");
        assert_eq!(track.title(), Some("primary"));

        let track = AudioTrack::new(1, "aac")
            .with_tag("TITLE", "legacy")
            .with_tag("TAG:title", "flattened");
        assert_eq!(track.title(), Some("flattened"));

        let track = AudioTrack::new(1, "aac").with_tag("TITLE", "legacy");
        assert_eq!(track.title(), Some("legacy"));
    }

    #[test]
    fn test_blank_title_falls_through() {
        let track = AudioTrack::new(2, "ac3")
            .with_tag("title", "  ")
            .with_tag("TITLE", "Director");
        assert_eq!(track.title(), Some("Director"));
    }

    #[test]
    fn test_no_title() {
        let track = AudioTrack::new(0, "flac").with_tag("language", "eng");
        assert_eq!(track.title(), None);
        assert_eq!(track.language(), Some("eng"));
    }
}
