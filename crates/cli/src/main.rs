mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ffbatch_core::tools::convert::{self, VideoConverter};
use ffbatch_core::tools::normalize::{self, LoudnessNormalizer};
use ffbatch_core::{
    load_config, load_config_from_env, validate_config, BatchConfig, FfprobeInspector, Harness,
    JobRunner, ProcessingStats, StatKey,
};

use cli::{Cli, Commands};

/// Exit code after an interrupt (128 + SIGINT).
const EXIT_INTERRUPTED: i32 = 130;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("Fatal error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<i32> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            load_config(path).with_context(|| format!("Failed to load config from {:?}", path))?
        }
        None => load_config_from_env().context("Failed to read configuration")?,
    };
    cli.apply(&mut config);
    validate_config(&config).context("Configuration validation failed")?;
    debug!(
        "Effective configuration: {}",
        serde_json::to_string(&config).unwrap_or_default()
    );

    JobRunner::validate_program(&config.tools.ffmpeg_path)
        .await
        .context("ffmpeg is not available")?;

    let stats = match &cli.command {
        Commands::Normalize(args) => {
            FfprobeInspector::new(config.tools.ffprobe_path.clone())
                .validate()
                .await
                .context("ffprobe is not available")?;

            let tool = LoudnessNormalizer::new(&args.batch.input, &config);
            run_batch(config, normalize::DEFAULT_OUTPUT_DIR, tool).await?
        }
        Commands::Convert(args) => {
            let tool = VideoConverter::new(&args.batch.input, args.quality, &config)
                .with_fps(args.fps());
            run_batch(config, convert::DEFAULT_OUTPUT_DIR, tool).await?
        }
    };

    Ok(exit_code(&stats))
}

async fn run_batch(
    config: BatchConfig,
    default_output_dir: &str,
    tool: impl ffbatch_core::BatchTool,
) -> Result<std::sync::Arc<ProcessingStats>> {
    Harness::new(config, default_output_dir)
        .run(tool)
        .await
        .context("Batch failed")
}

fn exit_code(stats: &ProcessingStats) -> i32 {
    if stats.interrupted() {
        EXIT_INTERRUPTED
    } else if stats.get(StatKey::Errors) > 0 {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code() {
        let stats = ProcessingStats::new();
        assert_eq!(exit_code(&stats), 0);

        stats.increment(StatKey::Errors);
        assert_eq!(exit_code(&stats), 1);

        stats.set_interrupted();
        assert_eq!(exit_code(&stats), EXIT_INTERRUPTED);
    }
}
