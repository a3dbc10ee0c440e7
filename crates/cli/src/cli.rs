//! Command-line arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use ffbatch_core::tools::convert::Quality;
use ffbatch_core::BatchConfig;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Batch ffmpeg transcoding",
    long_about = "Runs ffmpeg over a directory of media files with bounded concurrency, \
                  live progress, and clean shutdown on Ctrl+C."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (TOML)
    #[arg(short, long, global = true, env = "FFBATCH_CONFIG", value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Hide the live progress line
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Normalizes the loudness of every audio track in .mkv files
    Normalize(NormalizeArgs),
    /// Re-encodes video files to HEVC with NVENC
    Convert(ConvertArgs),
}

/// Options shared by every batch.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Input file or directory
    #[arg(short, long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output directory
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Number of files processed at once (default: CPU count / 3, at least 2)
    #[arg(short, long, value_name = "N", value_parser = clap::value_parser!(usize))]
    pub threads: Option<usize>,

    /// Replace existing output files
    #[arg(long)]
    pub overwrite: bool,
}

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Integrated loudness target in LUFS
    #[arg(long, value_name = "LUFS", allow_negative_numbers = true)]
    pub target_loudness: Option<f64>,

    /// Maximum true peak in dBTP
    #[arg(long, value_name = "DBTP", allow_negative_numbers = true)]
    pub true_peak: Option<f64>,

    /// Loudness range target in LU
    #[arg(long, value_name = "LU")]
    pub loudness_range: Option<f64>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    #[command(flatten)]
    pub batch: BatchArgs,

    /// Quality preset: 26/master, 30/normal, 34/compact, 40/compressed
    #[arg(long, default_value = "30")]
    pub quality: Quality,

    /// Output frame rate, or "original" to keep the source rate
    #[arg(long, default_value = "original")]
    pub fps: String,
}

impl ConvertArgs {
    pub fn fps(&self) -> Option<String> {
        (!self.fps.eq_ignore_ascii_case("original")).then(|| self.fps.clone())
    }
}

impl Cli {
    /// Applies command-line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut BatchConfig) {
        if self.quiet {
            config.runner.quiet = true;
        }

        let batch = match &self.command {
            Commands::Normalize(args) => {
                if let Some(target) = args.target_loudness {
                    config.loudness.target = target;
                }
                if let Some(true_peak) = args.true_peak {
                    config.loudness.true_peak = true_peak;
                }
                if let Some(range) = args.loudness_range {
                    config.loudness.range = range;
                }
                &args.batch
            }
            Commands::Convert(args) => &args.batch,
        };

        if let Some(output) = &batch.output {
            config.output_dir = Some(output.clone());
        }
        if let Some(threads) = batch.threads {
            config.workers.limit = Some(threads);
        }
        if batch.overwrite {
            config.overwrite = true;
        }
    }
}
