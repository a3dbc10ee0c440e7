//! Per-batch statistics and the registry of running child processes.
//!
//! One [`ProcessingStats`] is created per batch and shared by reference
//! (`Arc`) between the job runners, the cancellation coordinator and the
//! harness. Counters are plain atomics; the process registry sits behind a
//! mutex because the coordinator reads it from the signal task while runners
//! register and remove handles.

mod counters;
mod registry;
mod summary;

pub use counters::{ProcessingStats, StatKey};
pub use registry::{ProcessHandle, ProcessRegistry};
pub use summary::{format_duration, StatsSummary};
