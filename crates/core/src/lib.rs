pub mod cancel;
pub mod config;
pub mod filters;
pub mod harness;
pub mod metrics;
pub mod probe;
pub mod runner;
pub mod stats;
pub mod testing;
pub mod tools;

pub use cancel::{
    default_terminator, CancellationCoordinator, SignalGuard, TaskkillTerminator, Terminator,
};
pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, BatchConfig,
    ConfigError,
};
pub use filters::{loudnorm_filter, title_metadata_args, LoudnessParams};
pub use harness::{BatchContext, BatchTool, Harness, HarnessError};
pub use probe::{AudioInspector, AudioTrack, FfprobeInspector, ProbeError};
pub use runner::{Job, JobOutcome, JobRunner, RunnerError};
pub use stats::{ProcessHandle, ProcessRegistry, ProcessingStats, StatKey, StatsSummary};
