//! Final batch report.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

const SEPARATOR_WIDTH: usize = 50;

/// Counters and timing of a finished (or interrupted) batch.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub total: u64,
    pub processed: u64,
    pub skipped: u64,
    pub errors: u64,
    pub elapsed_secs: f64,
    pub interrupted: bool,
    pub started_at: DateTime<Utc>,
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let separator = "═".repeat(SEPARATOR_WIDTH);
        writeln!(f, "{}", separator)?;
        writeln!(f, "BATCH SUMMARY")?;
        writeln!(f, "Total files: {}", self.total)?;
        writeln!(f, "Processed: {}", self.processed)?;
        writeln!(f, "Skipped: {}", self.skipped)?;
        writeln!(f, "Errors: {}", self.errors)?;
        writeln!(
            f,
            "Elapsed seconds: {:.1} ({})",
            self.elapsed_secs,
            format_duration(self.elapsed_secs)
        )?;
        if self.interrupted {
            writeln!(f, "Interrupted: yes")?;
        }
        write!(f, "{}", separator)
    }
}

/// Formats seconds as `MM:SS`, or `HH:MM:SS` from one hour up.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(interrupted: bool) -> StatsSummary {
        StatsSummary {
            total: 5,
            processed: 3,
            skipped: 1,
            errors: 1,
            elapsed_secs: 75.25,
            interrupted,
            started_at: Utc::now(),
        }
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "00:00");
        assert_eq!(format_duration(59.9), "00:59");
        assert_eq!(format_duration(75.0), "01:15");
        assert_eq!(format_duration(3600.0), "01:00:00");
        assert_eq!(format_duration(3725.0), "01:02:05");
        assert_eq!(format_duration(-3.0), "00:00");
    }

    #[test]
    fn test_report_lines() {
        let text = summary(false).to_string();
        assert!(text.contains("Total files: 5"));
        assert!(text.contains("Processed: 3"));
        assert!(text.contains("Skipped: 1"));
        assert!(text.contains("Errors: 1"));
        assert!(text.contains("Elapsed seconds: 75.2 (01:15)") || text.contains("Elapsed seconds: 75.3 (01:15)"));
        assert!(!text.contains("Interrupted"));
    }

    #[test]
    fn test_report_marks_interruption() {
        assert!(summary(true).to_string().contains("Interrupted: yes"));
    }

    #[test]
    fn test_serializes() {
        let json = serde_json::to_value(summary(false)).unwrap();
        assert_eq!(json["processed"], 3);
        assert_eq!(json["interrupted"], false);
    }
}
