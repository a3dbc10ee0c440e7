//! Deletion of partial outputs.

use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::metrics;

/// Deletes `path`, retrying up to `attempts` times with `backoff` between tries.
///
/// Returns `true` when the file is gone (including when it never existed).
/// Giving up is logged and counted, never raised.
pub async fn remove_partial_output(path: &Path, attempts: u32, backoff: Duration) -> bool {
    let attempts = attempts.max(1);

    for attempt in 1..=attempts {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!(path = %path.display(), "Removed partial output");
                return true;
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No partial output to remove");
                return true;
            }
            Err(e) if attempt < attempts => {
                debug!(
                    path = %path.display(),
                    attempt,
                    error = %e,
                    "Partial output removal failed, retrying"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    attempts,
                    error = %e,
                    "Giving up on partial output removal"
                );
            }
        }
    }

    metrics::CLEANUP_FAILURES.inc();
    false
}
