//! Error types for the runner module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised before a child process is running.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// Program binary not found.
    #[error("Program not found: {path}")]
    ProgramNotFound { path: PathBuf },

    /// I/O error while spawning.
    #[error("Failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RunnerError {
    pub(crate) fn from_spawn(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::ProgramNotFound { path }
        } else {
            Self::Spawn { path, source }
        }
    }
}
