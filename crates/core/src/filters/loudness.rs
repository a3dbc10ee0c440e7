//! Loudness normalization filter graph.

use serde::{Deserialize, Serialize};

use crate::probe::AudioTrack;

/// Separator between filter chains in an ffmpeg filter graph.
pub const FILTER_SEPARATOR: char = ';';

/// Target values for the `loudnorm` filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoudnessParams {
    /// Integrated loudness target in LUFS.
    #[serde(default = "default_target")]
    pub target: f64,
    /// Maximum true peak in dBTP.
    #[serde(default = "default_true_peak")]
    pub true_peak: f64,
    /// Loudness range target in LU.
    #[serde(default = "default_range")]
    pub range: f64,
}

fn default_target() -> f64 {
    -16.0
}

fn default_true_peak() -> f64 {
    -1.5
}

fn default_range() -> f64 {
    11.0
}

impl Default for LoudnessParams {
    fn default() -> Self {
        Self {
            target: default_target(),
            true_peak: default_true_peak(),
            range: default_range(),
        }
    }
}

/// Label of the normalized output for the `i`-th audio track.
pub fn output_label(i: usize) -> String {
    format!("a{}", i)
}

/// Builds a filter graph with one `loudnorm` stage per track.
///
/// Stage `i` reads `[0:a:i]` and writes `[a{i}]`. Stages are joined by
/// [`FILTER_SEPARATOR`] with no trailing separator. No tracks, no stages.
pub fn loudnorm_filter(tracks: &[AudioTrack], params: &LoudnessParams) -> String {
    (0..tracks.len())
        .map(|i| {
            format!(
                "[0:a:{}]loudnorm=I={}:TP={}:LRA={}[{}]",
                i,
                params.target,
                params.true_peak,
                params.range,
                output_label(i)
            )
        })
        .collect::<Vec<_>>()
        .join(&FILTER_SEPARATOR.to_string())
}
