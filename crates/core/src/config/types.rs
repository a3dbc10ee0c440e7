use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::filters::LoudnessParams;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BatchConfig {
    /// Output directory; the batch tool's default is used when unset.
    #[serde(default)]
    pub output_dir: Option<PathBuf>,
    /// Re-encode even when the output file already exists.
    #[serde(default)]
    pub overwrite: bool,
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    #[serde(default)]
    pub loudness: LoudnessParams,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
    #[serde(default)]
    pub harness: HarnessConfig,
}

/// External binaries
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default = "default_ffmpeg_path")]
    pub ffmpeg_path: PathBuf,
    #[serde(default = "default_ffprobe_path")]
    pub ffprobe_path: PathBuf,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: default_ffmpeg_path(),
            ffprobe_path: default_ffprobe_path(),
        }
    }
}

fn default_ffmpeg_path() -> PathBuf {
    PathBuf::from("ffmpeg")
}

fn default_ffprobe_path() -> PathBuf {
    PathBuf::from("ffprobe")
}

/// Concurrency bound for a batch
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WorkersConfig {
    /// CPU count is divided by this to get the worker count.
    #[serde(default = "default_divisor")]
    pub divisor: usize,
    /// Lower bound, regardless of CPU count.
    #[serde(default = "default_floor")]
    pub floor: usize,
    /// Fixed worker count; overrides the CPU-derived value.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            divisor: default_divisor(),
            floor: default_floor(),
            limit: None,
        }
    }
}

fn default_divisor() -> usize {
    3
}

fn default_floor() -> usize {
    2
}

/// Job runner behaviour
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunnerConfig {
    /// Suppress the live progress line.
    #[serde(default)]
    pub quiet: bool,
    /// How long a signalled child gets before it is force-killed.
    #[serde(default = "default_terminate_grace_ms")]
    pub terminate_grace_ms: u64,
    /// Width the progress line is padded to.
    #[serde(default = "default_progress_width")]
    pub progress_width: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            terminate_grace_ms: default_terminate_grace_ms(),
            progress_width: default_progress_width(),
        }
    }
}

impl RunnerConfig {
    pub fn terminate_grace(&self) -> Duration {
        Duration::from_millis(self.terminate_grace_ms)
    }
}

fn default_terminate_grace_ms() -> u64 {
    5000
}

fn default_progress_width() -> usize {
    100
}

/// Partial output removal after cancellation
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CleanupConfig {
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl CleanupConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

fn default_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    1000
}

/// Harness settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HarnessConfig {
    /// Interval of the status heartbeat.
    #[serde(default = "default_status_interval_ms")]
    pub status_interval_ms: u64,
    /// Prometheus textfile written when the batch ends.
    #[serde(default)]
    pub metrics_path: Option<PathBuf>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            status_interval_ms: default_status_interval_ms(),
            metrics_path: None,
        }
    }
}

impl HarnessConfig {
    pub fn status_interval(&self) -> Duration {
        Duration::from_millis(self.status_interval_ms)
    }
}

fn default_status_interval_ms() -> u64 {
    2000
}
