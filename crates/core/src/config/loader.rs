use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use std::path::Path;

use super::{types::BatchConfig, ConfigError};

/// Load configuration from file with environment variable overrides
///
/// Nested keys are separated by a double underscore, e.g.
/// `FFBATCH_WORKERS__FLOOR=4` or `FFBATCH_TOOLS__FFMPEG_PATH=/opt/ffmpeg`.
pub fn load_config(path: &Path) -> Result<BatchConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: BatchConfig = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("FFBATCH_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from defaults and environment variables only
pub fn load_config_from_env() -> Result<BatchConfig, ConfigError> {
    Figment::from(Serialized::defaults(BatchConfig::default()))
        .merge(Env::prefixed("FFBATCH_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<BatchConfig, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
