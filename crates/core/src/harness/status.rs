//! Periodic status heartbeat.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::stats::{ProcessingStats, StatKey};

/// Logs counters and active processes every `interval` until `stop` fires.
pub(crate) fn spawn_status_task(
    stats: Arc<ProcessingStats>,
    interval: Duration,
    stop: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = stop.cancelled() => break,
                _ = ticker.tick() => {
                    debug!(
                        total = stats.get(StatKey::Total),
                        processed = stats.get(StatKey::Processed),
                        skipped = stats.get(StatKey::Skipped),
                        errors = stats.get(StatKey::Errors),
                        active = stats.registry().len(),
                        elapsed_secs = stats.elapsed().as_secs(),
                        "Batch status"
                    );
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_task_stops_on_cancel() {
        let stats = Arc::new(ProcessingStats::new());
        let stop = CancellationToken::new();
        let task = spawn_status_task(stats, Duration::from_millis(10), stop.clone());

        tokio::time::sleep(Duration::from_millis(35)).await;
        stop.cancel();

        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("status task should stop")
            .unwrap();
    }
}
