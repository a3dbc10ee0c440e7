//! Error types for the probe module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while inspecting a media file.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// FFprobe binary not found.
    #[error("FFprobe not found at path: {path}")]
    FfprobeNotFound { path: PathBuf },

    /// Input file not found.
    #[error("Input file not found: {path}")]
    InputNotFound { path: PathBuf },

    /// FFprobe exited with a non-zero status.
    #[error("FFprobe failed ({}): {stderr}", code.map_or_else(|| "killed".to_string(), |c| format!("exit code {}", c)))]
    ProbeFailed { code: Option<i32>, stderr: String },

    /// FFprobe output was not the expected JSON.
    #[error("Failed to parse ffprobe output: {reason}")]
    ParseError { reason: String },

    /// I/O error while running ffprobe.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProbeError {
    /// Creates a new parse error.
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::ParseError {
            reason: reason.into(),
        }
    }
}
