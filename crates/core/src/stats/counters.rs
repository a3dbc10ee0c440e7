//! Batch counters.

use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use super::registry::ProcessRegistry;
use super::summary::StatsSummary;

/// Named batch counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKey {
    /// Jobs that finished successfully.
    Processed,
    /// Jobs that failed (probe or encode).
    Errors,
    /// Inputs skipped because their output already exists.
    Skipped,
    /// Inputs seen by the batch.
    Total,
}

impl StatKey {
    pub const ALL: [StatKey; 4] = [
        StatKey::Processed,
        StatKey::Errors,
        StatKey::Skipped,
        StatKey::Total,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatKey::Processed => "processed",
            StatKey::Errors => "errors",
            StatKey::Skipped => "skipped",
            StatKey::Total => "total",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for StatKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Statistics of one batch run.
pub struct ProcessingStats {
    counters: [AtomicU64; 4],
    started: Instant,
    started_at: DateTime<Utc>,
    interrupted: AtomicBool,
    registry: ProcessRegistry,
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingStats {
    /// Starts the clock for a new batch.
    pub fn new() -> Self {
        Self {
            counters: Default::default(),
            started: Instant::now(),
            started_at: Utc::now(),
            interrupted: AtomicBool::new(false),
            registry: ProcessRegistry::new(),
        }
    }

    pub fn increment(&self, key: StatKey) {
        self.counters[key.slot()].fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self, key: StatKey) -> u64 {
        self.counters[key.slot()].load(Ordering::Relaxed)
    }

    /// Monotonic time since the batch started.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Wall-clock start of the batch.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn interrupted(&self) -> bool {
        self.interrupted.load(Ordering::SeqCst)
    }

    /// Marks the batch as interrupted. Returns `false` if it already was.
    pub fn set_interrupted(&self) -> bool {
        !self.interrupted.swap(true, Ordering::SeqCst)
    }

    /// Running child processes and outputs awaiting a terminal state.
    pub fn registry(&self) -> &ProcessRegistry {
        &self.registry
    }

    /// Snapshot of the counters and elapsed time.
    pub fn summary(&self) -> StatsSummary {
        StatsSummary {
            total: self.get(StatKey::Total),
            processed: self.get(StatKey::Processed),
            skipped: self.get(StatKey::Skipped),
            errors: self.get(StatKey::Errors),
            elapsed_secs: self.elapsed().as_secs_f64(),
            interrupted: self.interrupted(),
            started_at: self.started_at,
        }
    }

    /// Prints the final report block to stdout.
    pub fn print_summary(&self) {
        println!("{}", self.summary());
    }
}

impl fmt::Debug for ProcessingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ProcessingStats");
        for key in StatKey::ALL {
            s.field(key.as_str(), &self.get(key));
        }
        s.field("interrupted", &self.interrupted())
            .field("active_processes", &self.registry.len())
            .finish()
    }
}
