//! The armed / shutting-down state machine.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::cleanup::remove_partial_output;
use super::terminate::{default_terminator, Terminator};
use crate::config::CleanupConfig;
use crate::metrics;
use crate::stats::ProcessingStats;

/// Reacts to the first interrupt of a batch.
pub struct CancellationCoordinator {
    stats: Arc<ProcessingStats>,
    token: CancellationToken,
    terminator: Arc<dyn Terminator>,
    shutting_down: AtomicBool,
}

impl CancellationCoordinator {
    /// Creates an armed coordinator using the platform terminator.
    pub fn new(stats: Arc<ProcessingStats>, token: CancellationToken) -> Self {
        Self::with_terminator(stats, token, default_terminator())
    }

    pub fn with_terminator(
        stats: Arc<ProcessingStats>,
        token: CancellationToken,
        terminator: Arc<dyn Terminator>,
    ) -> Self {
        Self {
            stats,
            token,
            terminator,
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Moves to shutting-down. Only the first call has any effect.
    ///
    /// Returns `true` if this call performed the transition.
    pub fn trigger(&self) -> bool {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            debug!("Already shutting down, ignoring interrupt");
            return false;
        }

        warn!("Interrupt received, stopping batch");
        self.stats.set_interrupted();
        self.token.cancel();

        for handle in self.stats.registry().snapshot() {
            match self.terminator.terminate(&handle) {
                Ok(()) => info!(
                    pid = ?handle.pid(),
                    job = %handle.label(),
                    strategy = %self.terminator.name(),
                    "Terminating child process"
                ),
                Err(e) => warn!(
                    pid = ?handle.pid(),
                    job = %handle.label(),
                    error = %e,
                    "Failed to terminate child process"
                ),
            }
        }
        true
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// The stop condition observed by the batch and every runner.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn stats(&self) -> &Arc<ProcessingStats> {
        &self.stats
    }

    /// Starts listening for Ctrl-C (and SIGTERM on unix).
    ///
    /// Every signal received while the guard is alive is counted; only the
    /// first one triggers.
    pub fn install(self: &Arc<Self>) -> SignalGuard {
        let stop = CancellationToken::new();
        let coordinator = Arc::clone(self);
        let listening = stop.clone();

        let task = tokio::spawn(async move {
            #[cfg(unix)]
            let mut terminate =
                match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(stream) => Some(stream),
                    Err(e) => {
                        warn!(error = %e, "Failed to install SIGTERM handler");
                        None
                    }
                };

            loop {
                #[cfg(unix)]
                let sigterm = async {
                    match terminate.as_mut() {
                        Some(stream) => {
                            stream.recv().await;
                        }
                        None => std::future::pending::<()>().await,
                    }
                };
                #[cfg(not(unix))]
                let sigterm = std::future::pending::<()>();

                tokio::select! {
                    _ = listening.cancelled() => break,
                    result = tokio::signal::ctrl_c() => {
                        if let Err(e) = result {
                            warn!(error = %e, "Failed to listen for Ctrl+C");
                            listening.cancelled().await;
                            break;
                        }
                        info!("Ctrl+C received");
                    }
                    _ = sigterm => info!("SIGTERM received"),
                }

                metrics::SIGNALS_TOTAL.inc();
                coordinator.trigger();
            }
            debug!("Signal listener stopped");
        });

        SignalGuard {
            stop,
            task: Some(task),
        }
    }

    /// Deletes every output left unsettled by the batch.
    ///
    /// Returns how many were removed (or were already absent).
    pub async fn cleanup_partial_outputs(&self, config: &CleanupConfig) -> usize {
        let outputs = self.stats.registry().take_unsettled_outputs();
        if outputs.is_empty() {
            return 0;
        }

        info!(count = outputs.len(), "Cleaning up partial outputs");
        let mut removed = 0;
        for path in outputs {
            if remove_partial_output(&path, config.attempts, config.backoff()).await {
                removed += 1;
            }
        }
        removed
    }
}

/// Keeps the signal listener alive. Dropping it stops listening too.
pub struct SignalGuard {
    stop: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SignalGuard {
    /// Stops listening and waits for the listener task to end.
    pub async fn uninstall(mut self) {
        self.stop.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "Signal listener task failed");
            }
        }
    }
}

impl Drop for SignalGuard {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{ProcessHandle, StatKey};
    use std::io;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingTerminator {
        pids: Mutex<Vec<Option<u32>>>,
    }

    impl Terminator for RecordingTerminator {
        fn name(&self) -> &str {
            "recording"
        }

        fn terminate(&self, handle: &ProcessHandle) -> io::Result<()> {
            self.pids.lock().unwrap().push(handle.pid());
            Ok(())
        }
    }

    fn coordinator() -> (Arc<CancellationCoordinator>, Arc<RecordingTerminator>) {
        let stats = Arc::new(ProcessingStats::new());
        let terminator = Arc::new(RecordingTerminator::default());
        let coordinator = CancellationCoordinator::with_terminator(
            stats,
            CancellationToken::new(),
            terminator.clone(),
        );
        (Arc::new(coordinator), terminator)
    }

    #[test]
    fn test_trigger_terminates_registered_processes() {
        let (coordinator, terminator) = coordinator();
        let registry = coordinator.stats().registry();
        registry.register(registry.handle(Some(101), "a.mkv"));
        registry.register(registry.handle(Some(102), "b.mkv"));

        assert!(coordinator.trigger());

        assert!(coordinator.is_shutting_down());
        assert!(coordinator.stats().interrupted());
        assert!(coordinator.token().is_cancelled());
        assert_eq!(*terminator.pids.lock().unwrap(), vec![Some(101), Some(102)]);
    }

    #[test]
    fn test_second_trigger_has_no_effect() {
        let (coordinator, terminator) = coordinator();
        let registry = coordinator.stats().registry();
        registry.register(registry.handle(Some(7), "a.mkv"));

        assert!(coordinator.trigger());
        assert!(!coordinator.trigger());
        assert!(!coordinator.trigger());

        assert_eq!(terminator.pids.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_trigger_leaves_counters_alone() {
        let (coordinator, _) = coordinator();
        coordinator.stats().increment(StatKey::Processed);

        coordinator.trigger();

        assert_eq!(coordinator.stats().get(StatKey::Processed), 1);
        assert_eq!(coordinator.stats().get(StatKey::Errors), 0);
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_unsettled_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let finished = dir.path().join("finished.mkv");
        let partial = dir.path().join("partial.mkv");
        std::fs::write(&finished, b"complete").unwrap();
        std::fs::write(&partial, b"trunc").unwrap();

        let (coordinator, _) = coordinator();
        let registry = coordinator.stats().registry();
        registry.track_output(&finished);
        registry.track_output(&partial);
        registry.settle_output(&finished);

        let config = CleanupConfig {
            attempts: 3,
            backoff_ms: 1,
        };
        assert_eq!(coordinator.cleanup_partial_outputs(&config).await, 1);

        assert!(finished.exists());
        assert!(!partial.exists());
        // Nothing left to clean on a second pass.
        assert_eq!(coordinator.cleanup_partial_outputs(&config).await, 0);
    }

    #[tokio::test]
    async fn test_uninstall_stops_listener() {
        let (coordinator, _) = coordinator();
        let guard = coordinator.install();

        tokio::time::timeout(Duration::from_secs(5), guard.uninstall())
            .await
            .expect("listener should stop");
        assert!(!coordinator.is_shutting_down());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_triggers_shutdown() {
        let (coordinator, _) = coordinator();
        let guard = coordinator.install();
        // Let the listener register its handlers.
        tokio::time::sleep(Duration::from_millis(100)).await;

        nix::sys::signal::kill(nix::unistd::Pid::this(), nix::sys::signal::Signal::SIGTERM)
            .unwrap();

        tokio::time::timeout(Duration::from_secs(5), coordinator.token().cancelled())
            .await
            .expect("token should be cancelled");
        assert!(coordinator.stats().interrupted());
        guard.uninstall().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_sigterm_after_uninstall_is_ignored() {
        let (coordinator, _) = coordinator();
        let guard = coordinator.install();
        tokio::time::sleep(Duration::from_millis(100)).await;
        guard.uninstall().await;

        nix::sys::signal::kill(nix::unistd::Pid::this(), nix::sys::signal::Signal::SIGTERM)
            .unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;

        // The process survives and the coordinator no longer reacts.
        assert!(!coordinator.is_shutting_down());
        assert!(!coordinator.stats().interrupted());
    }
}
