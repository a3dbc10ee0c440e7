//! Loudness normalization of Matroska audio tracks.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use super::discovery::{find_files, MKV_EXTENSIONS};
use super::for_each_bounded;
use crate::config::BatchConfig;
use crate::filters::{loudnorm_filter, output_label, title_metadata_args, LoudnessParams};
use crate::harness::{BatchContext, BatchTool};
use crate::probe::{AudioInspector, AudioTrack, FfprobeInspector};
use crate::runner::Job;
use crate::stats::StatKey;

/// Default output directory name.
pub const DEFAULT_OUTPUT_DIR: &str = "normalized";

/// Normalizes every audio track of each input to the configured loudness.
///
/// Video and subtitle streams are copied, audio is re-encoded to AAC and
/// track titles are carried over. Files without audio are stream-copied.
pub struct LoudnessNormalizer {
    input: PathBuf,
    ffmpeg: PathBuf,
    inspector: Arc<dyn AudioInspector>,
    params: LoudnessParams,
    overwrite: bool,
}

impl LoudnessNormalizer {
    /// Creates a normalizer probing with the configured ffprobe.
    pub fn new(input: impl Into<PathBuf>, config: &BatchConfig) -> Self {
        Self {
            input: input.into(),
            ffmpeg: config.tools.ffmpeg_path.clone(),
            inspector: Arc::new(FfprobeInspector::new(config.tools.ffprobe_path.clone())),
            params: config.loudness,
            overwrite: config.overwrite,
        }
    }

    pub fn with_inspector(mut self, inspector: Arc<dyn AudioInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    async fn process_file(
        &self,
        ctx: &BatchContext,
        input: PathBuf,
        position: usize,
        total: usize,
    ) {
        let Some(file_name) = input.file_name() else {
            return;
        };
        let output = ctx.output_dir.join(file_name);

        if output.exists() && !self.overwrite {
            info!(output = %output.display(), "Output exists, skipping");
            ctx.stats.increment(StatKey::Skipped);
            ctx.stats.increment(StatKey::Total);
            return;
        }
        ctx.stats.increment(StatKey::Total);
        info!(file = %input.display(), position, total, "Processing file");

        let tracks = match self.inspector.audio_tracks(&input).await {
            Ok(tracks) => tracks,
            Err(e) if ctx.stats.interrupted() => {
                debug!(file = %input.display(), error = %e, "Probe stopped by interrupt");
                return;
            }
            Err(e) => {
                error!(file = %input.display(), error = %e, "Failed to read audio tracks");
                ctx.stats.increment(StatKey::Errors);
                return;
            }
        };

        let args = if tracks.is_empty() {
            info!(file = %input.display(), "No audio tracks, copying file");
            copy_args(&input, &output, self.overwrite)
        } else {
            debug!(
                tracks = tracks.len(),
                target = self.params.target,
                true_peak = self.params.true_peak,
                "Normalizing audio"
            );
            normalize_args(&input, &output, &tracks, &self.params, self.overwrite)
        };

        let job = Job::new(&self.ffmpeg, args)
            .with_input(&input)
            .with_output(&output)
            .at(position, total);
        ctx.runner
            .run(&job, &ctx.stats, StatKey::Processed, &ctx.cancel)
            .await;
    }
}

#[async_trait]
impl BatchTool for LoudnessNormalizer {
    fn name(&self) -> &str {
        "normalize"
    }

    async fn process(&self, ctx: BatchContext) {
        let files = match find_files(&self.input, MKV_EXTENSIONS) {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, "Cannot read input");
                ctx.stats.increment(StatKey::Errors);
                return;
            }
        };
        if files.is_empty() {
            warn!(input = %self.input.display(), "No .mkv files to process");
            return;
        }

        let total = files.len();
        info!(total, inspector = %self.inspector.name(), "Found files to normalize");

        let ctx = &ctx;
        for_each_bounded(ctx, files, move |position, file| {
            self.process_file(ctx, file, position, total)
        })
        .await;
    }
}

/// ffmpeg arguments normalizing every track in `tracks`.
pub fn normalize_args(
    input: &Path,
    output: &Path,
    tracks: &[AudioTrack],
    params: &LoudnessParams,
    overwrite: bool,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "warning".into(),
        "-stats".into(),
    ];
    if overwrite {
        args.push("-y".into());
    }
    args.extend([
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-filter_complex".into(),
        loudnorm_filter(tracks, params),
        "-map".into(),
        "0:v?".into(),
        "-map".into(),
        "0:s?".into(),
    ]);
    for i in 0..tracks.len() {
        args.push("-map".into());
        args.push(format!("[{}]", output_label(i)));
    }
    args.extend(
        ["-c:v", "copy", "-c:s", "copy", "-c:a", "aac"]
            .into_iter()
            .map(String::from),
    );
    args.extend(title_metadata_args(tracks));
    args.push(output.to_string_lossy().into_owned());
    args
}

/// ffmpeg arguments stream-copying a file without audio.
pub fn copy_args(input: &Path, output: &Path, overwrite: bool) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "warning".into(),
        "-stats".into(),
    ];
    if overwrite {
        args.push("-y".into());
    }
    args.extend([
        "-i".into(),
        input.to_string_lossy().into_owned(),
        "-c".into(),
        "copy".into(),
        output.to_string_lossy().into_owned(),
    ]);
    args
}
