//! Harness error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop a batch before or after its tool runs.
///
/// Per-file failures never show up here; tools count them instead.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Batch task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
