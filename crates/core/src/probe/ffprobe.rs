//! FFprobe-based inspector implementation.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::error::ProbeError;
use super::traits::AudioInspector;
use super::types::AudioTrack;
use crate::metrics;

/// Stream-level keys that old ffprobe builds emit instead of a `tags` object.
const LEGACY_TITLE_KEYS: [&str; 2] = ["TAG:title", "TITLE"];

/// Inspector that shells out to ffprobe.
#[derive(Debug, Clone)]
pub struct FfprobeInspector {
    ffprobe_path: PathBuf,
}

impl FfprobeInspector {
    /// Creates an inspector using the given ffprobe binary.
    pub fn new(ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Path of the ffprobe binary in use.
    pub fn ffprobe_path(&self) -> &Path {
        &self.ffprobe_path
    }

    fn probe_args(path: &Path) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "a".to_string(),
            "-show_entries".to_string(),
            "stream=index,codec_type,codec_name:stream_tags=*:format_tags=*".to_string(),
            "-of".to_string(),
            "json".to_string(),
            path.to_string_lossy().to_string(),
        ]
    }

    /// Checks that the ffprobe binary can be executed.
    pub async fn validate(&self) -> Result<(), ProbeError> {
        Command::new(&self.ffprobe_path)
            .arg("-version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;
        Ok(())
    }

    fn spawn_error(&self, e: std::io::Error) -> ProbeError {
        if e.kind() == std::io::ErrorKind::NotFound {
            ProbeError::FfprobeNotFound {
                path: self.ffprobe_path.clone(),
            }
        } else {
            ProbeError::Io(e)
        }
    }
}

#[async_trait]
impl AudioInspector for FfprobeInspector {
    fn name(&self) -> &str {
        "ffprobe"
    }

    async fn audio_tracks(&self, path: &Path) -> Result<Vec<AudioTrack>, ProbeError> {
        if !path.exists() {
            return Err(ProbeError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let args = Self::probe_args(path);
        debug!(
            "Querying audio metadata: {} {}",
            self.ffprobe_path.display(),
            args.join(" ")
        );

        let mut command = Command::new(&self.ffprobe_path);
        command.args(&args).stdin(Stdio::null()).kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        let output = command
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            metrics::PROBE_FAILURES.inc();
            return Err(ProbeError::ProbeFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let tracks =
            parse_audio_tracks(&stdout).inspect_err(|_| metrics::PROBE_FAILURES.inc())?;

        for (i, track) in tracks.iter().enumerate() {
            debug!(
                "Found audio track {} (stream #{}, codec {:?}, title {:?})",
                i + 1,
                track.index,
                track.codec_name,
                track.title()
            );
        }

        Ok(tracks)
    }
}

/// Parses `ffprobe -of json` output into audio tracks, preserving stream order.
///
/// Non-audio streams are dropped. A stream without an `index` gets its
/// position in the list.
pub fn parse_audio_tracks(output: &str) -> Result<Vec<AudioTrack>, ProbeError> {
    #[derive(Deserialize)]
    struct ProbeOutput {
        #[serde(default)]
        streams: Vec<ProbeStream>,
    }

    #[derive(Deserialize)]
    struct ProbeStream {
        index: Option<u32>,
        codec_type: Option<String>,
        codec_name: Option<String>,
        #[serde(default)]
        tags: BTreeMap<String, String>,
        #[serde(flatten)]
        extra: BTreeMap<String, serde_json::Value>,
    }

    let probe: ProbeOutput =
        serde_json::from_str(output).map_err(|e| ProbeError::parse(e.to_string()))?;

    let tracks = probe
        .streams
        .into_iter()
        .enumerate()
        .filter(|(_, s)| s.codec_type.as_deref().map_or(true, |t| t == "audio"))
        .map(|(position, stream)| {
            let mut tags = stream.tags;
            for key in LEGACY_TITLE_KEYS {
                if let Some(serde_json::Value::String(value)) = stream.extra.get(key) {
                    tags.entry(key.to_string()).or_insert_with(|| value.clone());
                }
            }
            AudioTrack {
                index: stream.index.unwrap_or(position as u32),
                codec_name: stream.codec_name,
                tags,
            }
        })
        .collect();

    Ok(tracks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_streams_one_titled() {
        let json = r#"{
            "programs": [],
            "streams": [
                {
                    "index": 1,
                    "codec_name": "aac",
                    "codec_type": "audio",
                    "tags": { "language": "eng" }
                },
                {
                    "index": 2,
                    "codec_name": "ac3",
                    "codec_type": "audio",
                    "tags": { "language": "eng", "title": "Commentary" }
                }
            ]
        }"#;

        let tracks = parse_audio_tracks(json).unwrap();
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].index, 1);
        assert_eq!(tracks[0].codec_name.as_deref(), Some("aac"));
        assert_eq!(tracks[0].title(), None);
        assert_eq!(tracks[1].index, 2);
        assert_eq!(tracks[1].title(), Some("Commentary"));
    }

    #[test]
    fn test_parse_legacy_stream_level_title() {
        let json = r#"{
            "streams": [
                { "index": 1, "codec_type": "audio", "TAG:title": "Russian" },
                { "index": 2, "codec_type": "audio", "TITLE": "English" }
            ]
        }"#;

        let tracks = parse_audio_tracks(json).unwrap();
        assert_eq!(tracks[0].title(), Some("Russian"));
        assert_eq!(tracks[1].title(), Some("English"));
    }

    #[test]
    fn test_parse_skips_non_audio_and_fills_index() {
        let json = r#"{
            "streams": [
                { "codec_type": "video", "codec_name": "h264" },
                { "codec_type": "audio", "codec_name": "opus" }
            ]
        }"#;

        let tracks = parse_audio_tracks(json).unwrap();
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].index, 1);
    }

    #[test]
    fn test_parse_no_streams() {
        assert!(parse_audio_tracks("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_audio_tracks("Invalid data found when processing input").unwrap_err();
        assert!(matches!(err, ProbeError::ParseError { .. }));
    }

    #[test]
    fn test_parse_is_repeatable() {
        let json = r#"{"streams":[{"index":0,"codec_type":"audio","tags":{"title":"A"}}]}"#;
        assert_eq!(
            parse_audio_tracks(json).unwrap(),
            parse_audio_tracks(json).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_input() {
        let inspector = FfprobeInspector::new("ffprobe");
        let err = inspector
            .audio_tracks(Path::new("/nonexistent/movie.mkv"))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::InputNotFound { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let inspector = FfprobeInspector::new("/nonexistent/bin/ffprobe");
        let err = inspector.validate().await.unwrap_err();
        assert!(matches!(err, ProbeError::FfprobeNotFound { .. }));
    }
}
