//! Platform strategies for stopping a child process.

use std::io;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::Arc;

use tracing::debug;

use crate::stats::ProcessHandle;

/// Stops a running child by process id.
pub trait Terminator: Send + Sync {
    /// Strategy name for logging.
    fn name(&self) -> &str;

    /// Asks the process behind `handle` to stop.
    ///
    /// A process that has already exited is not an error.
    fn terminate(&self, handle: &ProcessHandle) -> io::Result<()>;
}

/// Delivers SIGTERM to the child.
#[cfg(unix)]
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalTerminator;

#[cfg(unix)]
impl Terminator for SignalTerminator {
    fn name(&self) -> &str {
        "sigterm"
    }

    fn terminate(&self, handle: &ProcessHandle) -> io::Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = handle.pid() else {
            return Ok(());
        };
        let pid = i32::try_from(pid)
            .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

        match kill(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!(pid, "Process already exited");
                Ok(())
            }
            Err(errno) => Err(io::Error::from(errno)),
        }
    }
}

/// Forced kill of the child and its process tree with `taskkill`.
///
/// Used where signals cannot be delivered to children.
#[derive(Debug, Clone)]
pub struct TaskkillTerminator {
    program: String,
}

impl TaskkillTerminator {
    pub fn new() -> Self {
        Self {
            program: "taskkill".to_string(),
        }
    }

    /// Uses a different executable in place of `taskkill`.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Arguments passed to `taskkill` for `pid`.
    pub fn args(pid: u32) -> Vec<String> {
        vec![
            "/F".to_string(),
            "/T".to_string(),
            "/PID".to_string(),
            pid.to_string(),
        ]
    }
}

impl Default for TaskkillTerminator {
    fn default() -> Self {
        Self::new()
    }
}

impl Terminator for TaskkillTerminator {
    fn name(&self) -> &str {
        "taskkill"
    }

    /// Starts `taskkill` without waiting for it. Inside a runtime the exit
    /// status is collected on a background task; outside one the call blocks.
    fn terminate(&self, handle: &ProcessHandle) -> io::Result<()> {
        let Some(pid) = handle.pid() else {
            return Ok(());
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let status = Command::new(&self.program)
                .args(Self::args(pid))
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()?;
            log_taskkill_status(pid, status);
            return Ok(());
        };

        let mut child = {
            let _entered = runtime.enter();
            tokio::process::Command::new(&self.program)
                .args(Self::args(pid))
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?
        };
        runtime.spawn(async move {
            match child.wait().await {
                Ok(status) => log_taskkill_status(pid, status),
                Err(e) => debug!(pid, error = %e, "Failed to wait for taskkill"),
            }
        });
        Ok(())
    }
}

fn log_taskkill_status(pid: u32, status: ExitStatus) {
    if !status.success() {
        // taskkill exits 128 when the process is already gone
        debug!(pid, code = ?status.code(), "taskkill did not succeed");
    }
}

/// The terminator for the current platform.
pub fn default_terminator() -> Arc<dyn Terminator> {
    #[cfg(unix)]
    {
        Arc::new(SignalTerminator)
    }
    #[cfg(not(unix))]
    {
        Arc::new(TaskkillTerminator::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::ProcessRegistry;

    #[test]
    fn test_taskkill_args() {
        assert_eq!(TaskkillTerminator::args(4242), vec!["/F", "/T", "/PID", "4242"]);
    }

    #[test]
    fn test_handle_without_pid_is_noop() {
        let registry = ProcessRegistry::new();
        let handle = registry.handle(None, "never spawned");
        let terminator = TaskkillTerminator::with_program("/nonexistent/taskkill");
        assert!(terminator.terminate(&handle).is_ok());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_taskkill_does_not_wait_for_program() {
        use std::time::{Duration, Instant};

        let dir = tempfile::tempdir().unwrap();
        let slow = crate::testing::fake_binary(dir.path(), "taskkill", r#"sleep 2
touch "$0.done""#);
        let registry = ProcessRegistry::new();
        let handle = registry.handle(Some(4242), "ffmpeg");
        let terminator = TaskkillTerminator::with_program(slow.to_string_lossy());

        let started = Instant::now();
        terminator.terminate(&handle).unwrap();
        assert!(started.elapsed() < Duration::from_secs(1));
        assert!(!dir.path().join("taskkill.done").exists());
    }

    #[tokio::test]
    async fn test_taskkill_spawn_failure_is_reported() {
        let registry = ProcessRegistry::new();
        let handle = registry.handle(Some(4242), "ffmpeg");
        let terminator = TaskkillTerminator::with_program("/nonexistent/taskkill");
        assert!(terminator.terminate(&handle).is_err());
    }

    #[test]
    fn test_default_terminator_name() {
        let name = default_terminator().name().to_string();
        if cfg!(unix) {
            assert_eq!(name, "sigterm");
        } else {
            assert_eq!(name, "taskkill");
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_sigterm_stops_child() {
        use std::os::unix::process::ExitStatusExt;

        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        let registry = ProcessRegistry::new();
        let handle = registry.handle(Some(child.id()), "sleep");

        SignalTerminator.terminate(&handle).unwrap();

        let status = child.wait().unwrap();
        assert_eq!(status.signal(), Some(15));
        // Already reaped: ESRCH is swallowed.
        assert!(SignalTerminator.terminate(&handle).is_ok());
    }
}
