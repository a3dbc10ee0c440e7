//! Job description and outcome.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// One file's transcoding command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Binary to execute.
    pub program: PathBuf,
    /// Arguments, empty strings removed.
    pub args: Vec<String>,
    /// Source file.
    pub input: PathBuf,
    /// File the command writes.
    pub output: PathBuf,
    /// 1-based position in the batch.
    pub position: usize,
    /// Number of files in the batch.
    pub total: usize,
    /// Name shown on the progress line.
    pub display_name: String,
}

impl Job {
    /// Creates a job for `program args...`.
    ///
    /// Empty arguments are dropped so callers can splice optional flags as
    /// `""`.
    pub fn new<I, S>(program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let program = program.into();
        debug_assert!(
            !program.as_os_str().is_empty(),
            "job program must not be empty"
        );
        Self {
            program,
            args: args
                .into_iter()
                .map(Into::into)
                .filter(|a: &String| !a.is_empty())
                .collect(),
            input: PathBuf::new(),
            output: PathBuf::new(),
            position: 1,
            total: 1,
            display_name: String::new(),
        }
    }

    /// Sets the input path; also the display name unless one is set.
    pub fn with_input(mut self, input: impl Into<PathBuf>) -> Self {
        self.input = input.into();
        if self.display_name.is_empty() {
            self.display_name = file_name(&self.input);
        }
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    /// Sets the position within the batch.
    pub fn at(mut self, position: usize, total: usize) -> Self {
        self.position = position;
        self.total = total;
        self
    }

    pub fn named(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    /// Command line for logs.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().to_string())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(OsStr::to_string_lossy)
        .map(|s| s.to_string())
        .unwrap_or_else(|| path.to_string_lossy().to_string())
}

/// Terminal state of one job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    /// Exit code 0.
    Succeeded,
    /// Non-zero exit or spawn failure. The output file is left as-is.
    Failed { code: Option<i32>, reason: String },
    /// Stopped by cancellation. The output is left for the cleanup pass.
    Cancelled,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, JobOutcome::Succeeded)
    }

    /// Label used for metrics and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobOutcome::Succeeded => "succeeded",
            JobOutcome::Failed { .. } => "failed",
            JobOutcome::Cancelled => "cancelled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_args_dropped() {
        let job = Job::new("ffmpeg", ["-y", "", "-i", "in.mkv"]);
        assert_eq!(job.args, vec!["-y", "-i", "in.mkv"]);
    }

    #[test]
    fn test_display_name_from_input() {
        let job = Job::new("ffmpeg", Vec::<String>::new()).with_input("/media/in/movie.mkv");
        assert_eq!(job.display_name, "movie.mkv");

        let job = Job::new("ffmpeg", Vec::<String>::new())
            .named("custom")
            .with_input("/media/in/movie.mkv");
        assert_eq!(job.display_name, "custom");
    }

    #[test]
    fn test_command_line() {
        let job = Job::new("ffmpeg", ["-i", "a.mkv", "b.mkv"]);
        assert_eq!(job.command_line(), "ffmpeg -i a.mkv b.mkv");
    }

    #[test]
    fn test_outcome_success() {
        assert!(JobOutcome::Succeeded.is_success());
        assert!(!JobOutcome::Cancelled.is_success());
        assert!(!JobOutcome::Failed {
            code: Some(1),
            reason: String::new()
        }
        .is_success());
    }
}
