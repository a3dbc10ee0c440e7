//! Display that records what it was asked to show.

use std::sync::Mutex;

use crate::runner::ProgressDisplay;

/// [`ProgressDisplay`] keeping every update for assertions.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    lines: Mutex<Vec<String>>,
    clears: Mutex<usize>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every line passed to `update`, in order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    /// Number of `clear` calls.
    pub fn clears(&self) -> usize {
        *self.clears.lock().unwrap()
    }
}

impl ProgressDisplay for RecordingDisplay {
    fn update(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }

    fn clear(&self) {
        *self.clears.lock().unwrap() += 1;
    }
}
