//! Concurrency limit for a batch.

use crate::config::WorkersConfig;

/// `cpus / divisor`, never below `floor`.
pub fn worker_limit(cpus: usize, divisor: usize, floor: usize) -> usize {
    (cpus / divisor.max(1)).max(floor)
}

/// Resolves the limit for this machine. A fixed `limit` wins.
pub fn resolve_workers(config: &WorkersConfig) -> usize {
    config
        .limit
        .unwrap_or_else(|| worker_limit(num_cpus::get(), config.divisor, config.floor))
}
