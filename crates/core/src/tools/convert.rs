//! HEVC (NVENC) re-encoding with quality presets.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::discovery::{find_files, VIDEO_EXTENSIONS};
use super::for_each_bounded;
use crate::cancel::remove_partial_output;
use crate::config::{BatchConfig, CleanupConfig};
use crate::harness::{BatchContext, BatchTool};
use crate::runner::{Job, JobOutcome};
use crate::stats::StatKey;

/// Default output directory name.
pub const DEFAULT_OUTPUT_DIR: &str = "converted";

/// Suffix added to the input stem.
pub const OUTPUT_SUFFIX: &str = "_converted.mp4";

/// Scales the short side to 720 px, keeping the aspect ratio.
const DOWNSCALE_720P: &str = "scale='if(gt(iw,ih),-2,720)':'if(gt(iw,ih),720,-2)',flags=lanczos";

/// Constant-quality preset. Lower CQ means higher quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    /// CQ 26
    Master,
    /// CQ 30
    Normal,
    /// CQ 34
    Compact,
    /// CQ 40, also downscaled so the short side is at most 720 px.
    Compressed,
}

impl Quality {
    pub fn cq(&self) -> u8 {
        match self {
            Quality::Master => 26,
            Quality::Normal => 30,
            Quality::Compact => 34,
            Quality::Compressed => 40,
        }
    }

    pub fn downscales(&self) -> bool {
        matches!(self, Quality::Compressed)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quality::Master => "master",
            Quality::Normal => "normal",
            Quality::Compact => "compact",
            Quality::Compressed => "compressed",
        };
        write!(f, "{} (CQ {})", name, self.cq())
    }
}

impl FromStr for Quality {
    type Err = String;

    /// Accepts the preset name or its CQ value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "26" | "master" => Ok(Quality::Master),
            "30" | "normal" => Ok(Quality::Normal),
            "34" | "compact" => Ok(Quality::Compact),
            "40" | "compressed" => Ok(Quality::Compressed),
            other => Err(format!(
                "unknown quality '{}', expected 26/30/34/40 or master/normal/compact/compressed",
                other
            )),
        }
    }
}

/// Re-encodes video files to HEVC in MP4.
///
/// Unlike the normalizer, a failed encode removes its partial output.
pub struct VideoConverter {
    input: PathBuf,
    ffmpeg: PathBuf,
    quality: Quality,
    fps: Option<String>,
    overwrite: bool,
    cleanup: CleanupConfig,
}

impl VideoConverter {
    pub fn new(input: impl Into<PathBuf>, quality: Quality, config: &BatchConfig) -> Self {
        Self {
            input: input.into(),
            ffmpeg: config.tools.ffmpeg_path.clone(),
            quality,
            fps: None,
            overwrite: config.overwrite,
            cleanup: config.cleanup.clone(),
        }
    }

    /// Forces the output frame rate. `None` keeps the source rate.
    pub fn with_fps(mut self, fps: Option<String>) -> Self {
        self.fps = fps;
        self
    }

    async fn process_file(
        &self,
        ctx: &BatchContext,
        input: PathBuf,
        position: usize,
        total: usize,
    ) {
        let output = ctx.output_dir.join(output_name(&input));

        if output.exists() && !self.overwrite {
            info!(output = %output.display(), "Output exists, skipping");
            ctx.stats.increment(StatKey::Skipped);
            ctx.stats.increment(StatKey::Total);
            return;
        }
        ctx.stats.increment(StatKey::Total);
        info!(
            file = %input.display(),
            position,
            total,
            quality = %self.quality,
            fps = self.fps.as_deref().unwrap_or("original"),
            "Converting file"
        );

        let args = convert_args(&input, &output, self.quality, self.fps.as_deref());
        let job = Job::new(&self.ffmpeg, args)
            .with_input(&input)
            .with_output(&output)
            .at(position, total);

        let outcome = ctx
            .runner
            .run(&job, &ctx.stats, StatKey::Processed, &ctx.cancel)
            .await;

        if let JobOutcome::Failed { .. } = outcome {
            warn!(output = %output.display(), "Removing output of failed conversion");
            remove_partial_output(&output, self.cleanup.attempts, self.cleanup.backoff()).await;
        }
    }
}

#[async_trait]
impl BatchTool for VideoConverter {
    fn name(&self) -> &str {
        "convert"
    }

    async fn process(&self, ctx: BatchContext) {
        let files = match find_files(&self.input, VIDEO_EXTENSIONS) {
            Ok(files) => files,
            Err(e) => {
                error!(error = %e, "Cannot read input");
                ctx.stats.increment(StatKey::Errors);
                return;
            }
        };
        if files.is_empty() {
            warn!(input = %self.input.display(), "No video files to convert");
            return;
        }

        let total = files.len();
        info!(total, quality = %self.quality, "Found files to convert");

        let ctx = &ctx;
        for_each_bounded(ctx, files, move |position, file| {
            self.process_file(ctx, file, position, total)
        })
        .await;
    }
}

/// `<stem>_converted.mp4`
pub fn output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{}{}", stem, OUTPUT_SUFFIX)
}

/// ffmpeg arguments for one conversion.
pub fn convert_args(
    input: &Path,
    output: &Path,
    quality: Quality,
    fps: Option<&str>,
) -> Vec<String> {
    let mut args: Vec<String> = vec![
        "-hide_banner".into(),
        "-loglevel".into(),
        "warning".into(),
        "-stats".into(),
        "-y".into(),
        "-i".into(),
        input.to_string_lossy().into_owned(),
    ];
    args.extend(
        [
            "-c:v",
            "hevc_nvenc",
            "-preset",
            "hq",
            "-rc",
            "vbr_hq",
            "-cq",
        ]
        .into_iter()
        .map(String::from),
    );
    args.push(quality.cq().to_string());
    args.extend(
        [
            "-spatial_aq",
            "1",
            "-temporal_aq",
            "1",
            "-aq-strength",
            "8",
            "-rc-lookahead",
            "32",
            "-bf",
            "4",
            "-refs",
            "4",
            "-b_ref_mode",
            "middle",
            "-movflags",
            "+faststart",
            "-c:a",
            "copy",
        ]
        .into_iter()
        .map(String::from),
    );

    let mut filters = Vec::new();
    if quality.downscales() {
        filters.push(DOWNSCALE_720P.to_string());
    }
    if let Some(fps) = fps {
        filters.push(format!("fps={}", fps));
    }
    if !filters.is_empty() {
        args.push("-vf".into());
        args.push(filters.join(","));
    }

    args.push(output.to_string_lossy().into_owned());
    args
}
