//! Live progress display.

use std::io::Write;

/// Where progress lines go.
pub trait ProgressDisplay: Send + Sync {
    /// Replaces the current line with `line`.
    fn update(&self, line: &str);

    /// Blanks the current line.
    fn clear(&self);
}

/// Rewrites the last terminal line on stdout.
#[derive(Debug, Clone)]
pub struct TerminalDisplay {
    width: usize,
}

impl TerminalDisplay {
    pub fn new(width: usize) -> Self {
        Self { width }
    }
}

impl ProgressDisplay for TerminalDisplay {
    fn update(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{}", line);
        let _ = out.flush();
    }

    fn clear(&self) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\r{}\r", " ".repeat(self.width));
        let _ = out.flush();
    }
}

/// Discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl ProgressDisplay for NullDisplay {
    fn update(&self, _line: &str) {}

    fn clear(&self) {}
}
