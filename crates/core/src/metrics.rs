//! Prometheus metrics for batch runs.
//!
//! This module provides metrics for:
//! - Jobs (outcomes, durations)
//! - Probing (ffprobe failures)
//! - Cancellation (signals received, cleanup failures)
//!
//! There is no server to scrape them; the harness renders the registry to a
//! node-exporter textfile when `harness.metrics_path` is set.

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

use crate::runner::JobOutcome;

/// Registry holding every batch metric.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    for metric in all_metrics() {
        registry.register(metric).unwrap();
    }
    registry
});

// =============================================================================
// Job Metrics
// =============================================================================

/// Jobs run total by outcome.
pub static JOBS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("ffbatch_jobs_total", "Total transcoding jobs run"),
        &["outcome"], // "succeeded", "failed", "cancelled"
    )
    .unwrap()
});

/// Job duration in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("ffbatch_job_duration_seconds", "Duration of transcoding jobs")
            .buckets(vec![1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0, 1800.0, 3600.0]),
        &["outcome"],
    )
    .unwrap()
});

// =============================================================================
// Probe & Cancellation Metrics
// =============================================================================

/// Probe failures total.
pub static PROBE_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ffbatch_probe_failures_total", "Total failed ffprobe runs").unwrap()
});

/// Partial outputs that could not be deleted.
pub static CLEANUP_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "ffbatch_cleanup_failures_total",
        "Total partial outputs left behind after cleanup gave up",
    )
    .unwrap()
});

/// Interrupt and termination signals received.
pub static SIGNALS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("ffbatch_signals_total", "Total shutdown signals received").unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Records one finished job.
pub fn record_job(outcome: &JobOutcome, elapsed: Duration) {
    JOBS_TOTAL.with_label_values(&[outcome.as_str()]).inc();
    JOB_DURATION
        .with_label_values(&[outcome.as_str()])
        .observe(elapsed.as_secs_f64());
}

/// Get all batch metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(JOBS_TOTAL.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(PROBE_FAILURES.clone()),
        Box::new(CLEANUP_FAILURES.clone()),
        Box::new(SIGNALS_TOTAL.clone()),
    ]
}

/// Encode all metrics as Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Writes [`render`] output to `path`, replacing it atomically.
pub fn write_textfile(path: &Path) -> std::io::Result<()> {
    let tmp = path.with_extension("prom.tmp");
    std::fs::write(&tmp, render())?;
    std::fs::rename(&tmp, path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_returns_prometheus_format() {
        record_job(&JobOutcome::Succeeded, Duration::from_millis(1500));
        PROBE_FAILURES.inc();
        SIGNALS_TOTAL.inc();
        CLEANUP_FAILURES.inc();

        let output = render();
        assert!(output.contains("ffbatch_jobs_total{outcome=\"succeeded\"}"));
        assert!(output.contains("ffbatch_job_duration_seconds"));
        assert!(output.contains("ffbatch_probe_failures_total"));
        assert!(output.contains("ffbatch_signals_total"));
        assert!(output.contains("ffbatch_cleanup_failures_total"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_write_textfile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ffbatch.prom");
        record_job(&JobOutcome::Cancelled, Duration::from_secs(2));

        write_textfile(&path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("ffbatch_jobs_total"));
        assert!(!dir.path().join("ffbatch.prom.tmp").exists());
    }
}
