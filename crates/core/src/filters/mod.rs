//! Pure builders for ffmpeg arguments derived from probed audio tracks.
//!
//! - [`loudnorm_filter`] produces the `-filter_complex` graph that runs one
//!   EBU R128 `loudnorm` stage per audio track.
//! - [`title_metadata_args`] re-attaches the original track titles to the
//!   re-encoded output tracks.
//!
//! Neither touches the file system; the same input always yields the same
//! output.

mod loudness;
mod metadata;

pub use loudness::{loudnorm_filter, output_label, LoudnessParams, FILTER_SEPARATOR};
pub use metadata::{escape_title, title_metadata_args};
