//! The batch skeleton.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::error::HarnessError;
use super::status::spawn_status_task;
use super::workers::resolve_workers;
use crate::cancel::{CancellationCoordinator, Terminator};
use crate::config::BatchConfig;
use crate::metrics;
use crate::runner::JobRunner;
use crate::stats::ProcessingStats;

/// A batch processing function plugged into the [`Harness`].
#[async_trait]
pub trait BatchTool: Send + Sync + 'static {
    /// Tool name for logging.
    fn name(&self) -> &str;

    /// Processes the whole batch.
    ///
    /// Per-file failures are counted on `ctx.stats`, never returned. The tool
    /// should stop starting new work once `ctx.cancel` fires.
    async fn process(&self, ctx: BatchContext);
}

/// Everything a [`BatchTool`] gets from the harness.
#[derive(Clone)]
pub struct BatchContext {
    pub stats: Arc<ProcessingStats>,
    pub cancel: CancellationToken,
    pub output_dir: PathBuf,
    pub runner: Arc<JobRunner>,
    /// Maximum number of concurrent jobs.
    pub workers: usize,
}

impl BatchContext {
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Runs one [`BatchTool`] from start to summary.
///
/// Unless built with [`Harness::without_signal_handlers`], `run` listens for
/// Ctrl-C and SIGTERM for the duration of the batch. The runtime keeps its
/// OS-level handler afterwards: once `run` returns, further Ctrl-C presses
/// are ignored instead of terminating the process. Callers running several
/// batches in one process should install their own handling between them,
/// or exit after the last batch.
pub struct Harness {
    config: BatchConfig,
    output_dir: PathBuf,
    stats: Arc<ProcessingStats>,
    token: CancellationToken,
    coordinator: Arc<CancellationCoordinator>,
    runner: Arc<JobRunner>,
    install_signals: bool,
}

impl Harness {
    /// `default_output_dir` is used unless the config names one.
    pub fn new(config: BatchConfig, default_output_dir: impl Into<PathBuf>) -> Self {
        let output_dir = config
            .output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir.into());
        let stats = Arc::new(ProcessingStats::new());
        let token = CancellationToken::new();
        let coordinator = Arc::new(CancellationCoordinator::new(stats.clone(), token.clone()));
        let runner = Arc::new(JobRunner::with_terminal(config.runner.clone()));

        Self {
            config,
            output_dir,
            stats,
            token,
            coordinator,
            runner,
            install_signals: true,
        }
    }

    /// Replaces the job runner (e.g. to capture progress output).
    pub fn with_runner(mut self, runner: JobRunner) -> Self {
        self.runner = Arc::new(runner);
        self
    }

    /// Replaces the platform terminator.
    pub fn with_terminator(mut self, terminator: Arc<dyn Terminator>) -> Self {
        self.coordinator = Arc::new(CancellationCoordinator::with_terminator(
            self.stats.clone(),
            self.token.clone(),
            terminator,
        ));
        self
    }

    /// Skips installing OS signal listeners. The coordinator can still be
    /// triggered directly.
    pub fn without_signal_handlers(mut self) -> Self {
        self.install_signals = false;
        self
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn stats(&self) -> Arc<ProcessingStats> {
        self.stats.clone()
    }

    pub fn coordinator(&self) -> Arc<CancellationCoordinator> {
        self.coordinator.clone()
    }

    /// Runs `tool` and prints the summary, interrupted or not.
    pub async fn run<T: BatchTool>(self, tool: T) -> Result<Arc<ProcessingStats>, HarnessError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|source| HarnessError::OutputDir {
                path: self.output_dir.clone(),
                source,
            })?;

        let workers = resolve_workers(&self.config.workers);
        info!(
            tool = %tool.name(),
            output_dir = %self.output_dir.display(),
            workers,
            "Starting batch"
        );

        let status_stop = self.token.child_token();
        let status = spawn_status_task(
            self.stats.clone(),
            self.config.harness.status_interval(),
            status_stop.clone(),
        );

        let guard = self.install_signals.then(|| self.coordinator.install());

        let ctx = BatchContext {
            stats: self.stats.clone(),
            cancel: self.token.clone(),
            output_dir: self.output_dir.clone(),
            runner: self.runner.clone(),
            workers,
        };
        let main = tokio::spawn(async move { tool.process(ctx).await });
        let joined = main.await;

        status_stop.cancel();
        if let Err(e) = status.await {
            warn!(error = %e, "Status task failed");
        }
        if let Some(guard) = guard {
            guard.uninstall().await;
        }

        if self.stats.interrupted() {
            let removed = self
                .coordinator
                .cleanup_partial_outputs(&self.config.cleanup)
                .await;
            debug!(removed, "Partial output cleanup finished");
        }

        if let Some(path) = &self.config.harness.metrics_path {
            match metrics::write_textfile(path) {
                Ok(()) => debug!(path = %path.display(), "Wrote metrics textfile"),
                Err(e) => warn!(path = %path.display(), error = %e, "Failed to write metrics"),
            }
        }

        self.stats.print_summary();
        joined?;
        Ok(self.stats)
    }
}
