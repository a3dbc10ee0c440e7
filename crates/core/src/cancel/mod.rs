//! Cancellation coordination.
//!
//! The coordinator owns the batch's stop condition. It moves from armed to
//! shutting-down exactly once, on the first interrupt or termination signal,
//! and then:
//!
//! 1. marks the batch interrupted on [`ProcessingStats`](crate::stats::ProcessingStats),
//! 2. cancels the shared [`CancellationToken`](tokio_util::sync::CancellationToken),
//! 3. asks the [`Terminator`] to stop every registered child.
//!
//! Once the batch task has unwound, [`CancellationCoordinator::cleanup_partial_outputs`]
//! deletes outputs whose jobs never reached a terminal outcome.

mod cleanup;
mod coordinator;
mod terminate;

pub use cleanup::remove_partial_output;
pub use coordinator::{CancellationCoordinator, SignalGuard};
#[cfg(unix)]
pub use terminate::SignalTerminator;
pub use terminate::{default_terminator, TaskkillTerminator, Terminator};
