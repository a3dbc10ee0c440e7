//! Job runner: one transcoding child process per invocation.
//!
//! The runner spawns the command with its stderr captured, scrapes the
//! elapsed timecode and speed from each output line, rewrites a single
//! progress line on the live display, and turns the exit status into a
//! [`JobOutcome`] while updating the batch counters.
//!
//! # Example
//!
//! ```ignore
//! use ffbatch_core::runner::{Job, JobRunner};
//! use ffbatch_core::stats::{ProcessingStats, StatKey};
//!
//! let runner = JobRunner::with_terminal(RunnerConfig::default());
//! let job = Job::new("ffmpeg", args)
//!     .with_input("in/movie.mkv")
//!     .with_output("out/movie.mkv")
//!     .at(1, 10);
//!
//! let outcome = runner.run(&job, &stats, StatKey::Processed, &cancel).await;
//! if outcome.is_success() { /* ... */ }
//! ```

mod display;
mod error;
mod job;
mod job_runner;
mod progress;

pub use display::{NullDisplay, ProgressDisplay, TerminalDisplay};
pub use error::RunnerError;
pub use job::{Job, JobOutcome};
pub use job_runner::JobRunner;
pub use progress::{format_progress_line, parse_progress, LineSplitter, Progress};
