//! Child process execution with progress reporting.

use std::collections::VecDeque;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, Command};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::display::{ProgressDisplay, TerminalDisplay};
use super::error::RunnerError;
use super::job::{Job, JobOutcome};
use super::progress::{format_progress_line, parse_progress, LineSplitter};
use crate::config::RunnerConfig;
use crate::metrics;
use crate::stats::{ProcessHandle, ProcessRegistry, ProcessingStats, StatKey};

/// Non-progress stderr lines kept for the failure log.
const STDERR_TAIL_LINES: usize = 10;

const READ_CHUNK: usize = 4096;

/// Runs jobs one attempt at a time. Never retries.
pub struct JobRunner {
    config: RunnerConfig,
    display: Arc<dyn ProgressDisplay>,
}

/// Keeps a handle in the registry for as long as the child is alive.
struct Registration<'a> {
    registry: &'a ProcessRegistry,
    handle: ProcessHandle,
}

impl<'a> Registration<'a> {
    fn new(registry: &'a ProcessRegistry, handle: ProcessHandle) -> Self {
        registry.register(handle.clone());
        Self { registry, handle }
    }
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.remove(&self.handle);
    }
}

enum Exit {
    Status(ExitStatus),
    WaitFailed(std::io::Error),
    Cancelled,
}

impl JobRunner {
    pub fn new(config: RunnerConfig, display: Arc<dyn ProgressDisplay>) -> Self {
        Self { config, display }
    }

    /// Runner drawing progress on the terminal.
    pub fn with_terminal(config: RunnerConfig) -> Self {
        let display = Arc::new(TerminalDisplay::new(config.progress_width));
        Self::new(config, display)
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs `job` to completion or cancellation.
    ///
    /// Exit code 0 increments `key`. A non-zero exit increments
    /// [`StatKey::Errors`] and leaves the output file untouched. A job stopped
    /// by `cancel`, or killed while the batch is interrupted, counts as
    /// neither; its output stays registered as unsettled for the cleanup pass.
    pub async fn run(
        &self,
        job: &Job,
        stats: &ProcessingStats,
        key: StatKey,
        cancel: &CancellationToken,
    ) -> JobOutcome {
        if cancel.is_cancelled() {
            debug!("Not starting {}: batch cancelled", job.display_name);
            return JobOutcome::Cancelled;
        }

        let started = Instant::now();
        debug!("Running: {}", job.command_line());

        let mut child = match self.spawn(job) {
            Ok(child) => child,
            Err(e) => {
                error!("[{}/{}] {}: {}", job.position, job.total, job.display_name, e);
                let outcome = JobOutcome::Failed {
                    code: None,
                    reason: e.to_string(),
                };
                self.count_failure(stats);
                metrics::record_job(&outcome, started.elapsed());
                return outcome;
            }
        };

        let registry = stats.registry();
        if !job.output.as_os_str().is_empty() {
            registry.track_output(&job.output);
        }
        let registration = Registration::new(
            registry,
            registry.handle(child.id(), job.display_name.clone()),
        );

        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        let exit = match child.stderr.take() {
            Some(stderr) => {
                if self.pump_stderr(job, stderr, &mut tail, cancel).await {
                    Exit::Cancelled
                } else {
                    self.wait(&mut child, cancel).await
                }
            }
            None => self.wait(&mut child, cancel).await,
        };

        if !self.config.quiet {
            self.display.clear();
        }

        let outcome = match exit {
            Exit::Cancelled => {
                self.stop(&mut child, job).await;
                JobOutcome::Cancelled
            }
            Exit::Status(status) if status.success() => JobOutcome::Succeeded,
            Exit::Status(_) if stats.interrupted() => JobOutcome::Cancelled,
            Exit::Status(status) => JobOutcome::Failed {
                code: status.code(),
                reason: format!("exited with {}", status),
            },
            Exit::WaitFailed(e) => JobOutcome::Failed {
                code: None,
                reason: format!("failed to wait for process: {}", e),
            },
        };
        drop(registration);

        match &outcome {
            JobOutcome::Succeeded => {
                registry.settle_output(&job.output);
                stats.increment(key);
                debug!(
                    "[{}/{}] {} finished in {:.1}s",
                    job.position,
                    job.total,
                    job.display_name,
                    started.elapsed().as_secs_f64()
                );
            }
            JobOutcome::Failed { reason, .. } => {
                registry.settle_output(&job.output);
                self.count_failure(stats);
                error!(
                    "[{}/{}] {} failed: {}",
                    job.position, job.total, job.display_name, reason
                );
                for line in &tail {
                    error!("  {}", line);
                }
            }
            JobOutcome::Cancelled => {
                info!(
                    "[{}/{}] {} cancelled",
                    job.position, job.total, job.display_name
                );
            }
        }

        metrics::record_job(&outcome, started.elapsed());
        outcome
    }

    /// Checks that `program -version` can be spawned.
    pub async fn validate_program(program: &Path) -> Result<(), RunnerError> {
        Command::new(program)
            .arg("-version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| RunnerError::from_spawn(program.to_path_buf(), e))?;
        Ok(())
    }

    /// Spawns the child in its own process group, so a terminal Ctrl-C only
    /// reaches it through the cancellation coordinator.
    fn spawn(&self, job: &Job) -> Result<Child, RunnerError> {
        let mut command = Command::new(&job.program);
        command
            .args(&job.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        command
            .spawn()
            .map_err(|e| RunnerError::from_spawn(job.program.clone(), e))
    }

    /// Reads stderr until EOF. Returns `true` if cancelled first.
    async fn pump_stderr(
        &self,
        job: &Job,
        mut stderr: ChildStderr,
        tail: &mut VecDeque<String>,
        cancel: &CancellationToken,
    ) -> bool {
        let mut splitter = LineSplitter::new();
        let mut buf = vec![0u8; READ_CHUNK];

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return true,
                read = stderr.read(&mut buf) => match read {
                    Ok(0) => break,
                    Ok(n) => {
                        for line in splitter.push(&buf[..n]) {
                            self.handle_line(job, line, tail);
                        }
                    }
                    Err(e) => {
                        warn!("Lost stderr of {}: {}", job.display_name, e);
                        break;
                    }
                },
            }
        }

        if let Some(line) = splitter.finish() {
            self.handle_line(job, line, tail);
        }
        false
    }

    fn handle_line(&self, job: &Job, line: String, tail: &mut VecDeque<String>) {
        match parse_progress(&line) {
            Some(progress) => {
                if !self.config.quiet {
                    self.display.update(&format_progress_line(
                        job,
                        &progress,
                        self.config.progress_width,
                    ));
                }
            }
            None => {
                if tail.len() == STDERR_TAIL_LINES {
                    tail.pop_front();
                }
                tail.push_back(line);
            }
        }
    }

    async fn wait(&self, child: &mut Child, cancel: &CancellationToken) -> Exit {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Exit::Cancelled,
            status = child.wait() => match status {
                Ok(status) => Exit::Status(status),
                Err(e) => Exit::WaitFailed(e),
            },
        }
    }

    /// Gives a signalled child the grace period, then kills it.
    async fn stop(&self, child: &mut Child, job: &Job) {
        let grace = self.config.terminate_grace();
        match timeout(grace, child.wait()).await {
            Ok(Ok(status)) => debug!("{} exited after cancellation: {}", job.display_name, status),
            Ok(Err(e)) => warn!("Failed to reap {}: {}", job.display_name, e),
            Err(_) => {
                warn!(
                    "{} still running {}ms after termination request, killing",
                    job.display_name,
                    grace.as_millis()
                );
                if let Err(e) = child.kill().await {
                    warn!("Failed to kill {}: {}", job.display_name, e);
                }
            }
        }
    }

    fn count_failure(&self, stats: &ProcessingStats) {
        if !stats.interrupted() {
            stats.increment(StatKey::Errors);
        }
    }
}
