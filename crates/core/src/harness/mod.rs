//! Orchestration harness shared by every batch tool.
//!
//! A tool only supplies its processing function (a [`BatchTool`]) and a
//! default output directory. The harness owns everything around it: output
//! directory creation, the status heartbeat, signal handling, cleanup of
//! interrupted outputs and the final summary.

mod batch;
mod error;
mod status;
mod workers;

pub use batch::{BatchContext, BatchTool, Harness};
pub use error::HarnessError;
pub use workers::{resolve_workers, worker_limit};
