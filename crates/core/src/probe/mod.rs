//! Audio track inspection via ffprobe.
//!
//! The inspector queries a media file's audio streams and their tags. It
//! never modifies the file, so the same query can be repeated with identical
//! results.
//!
//! # Example
//!
//! ```ignore
//! use ffbatch_core::probe::{AudioInspector, FfprobeInspector};
//!
//! let inspector = FfprobeInspector::new("ffprobe");
//! let tracks = inspector.audio_tracks(Path::new("movie.mkv")).await?;
//! for track in &tracks {
//!     println!("#{} {:?} {:?}", track.index, track.codec_name, track.title());
//! }
//! ```

mod error;
mod ffprobe;
mod traits;
mod types;

pub use error::ProbeError;
pub use ffprobe::{parse_audio_tracks, FfprobeInspector};
pub use traits::AudioInspector;
pub use types::{AudioTrack, TITLE_KEYS};
