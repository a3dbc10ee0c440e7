//! Testing utilities and test doubles.
//!
//! This module provides stand-ins for the external collaborators of a batch:
//! the probe binary, the live display and the transcoding binary itself.
//!
//! # Example
//!
//! ```rust,ignore
//! use ffbatch_core::testing::{MockInspector, RecordingDisplay};
//!
//! let inspector = MockInspector::new();
//! inspector.set_tracks("/in/movie.mkv", vec![AudioTrack::new(1, "aac")]);
//!
//! let display = Arc::new(RecordingDisplay::new());
//! let runner = JobRunner::new(RunnerConfig::default(), display.clone());
//! ```

mod fake_binary;
mod mock_inspector;
mod recording_display;

#[cfg(unix)]
pub use fake_binary::{fake_binary, fake_ffprobe};
pub use mock_inspector::MockInspector;
pub use recording_display::RecordingDisplay;
