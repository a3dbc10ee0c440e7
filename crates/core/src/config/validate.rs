use super::{types::BatchConfig, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Worker divisor, floor and fixed limit are non-zero
/// - Cleanup makes at least one attempt
/// - Loudness parameters are finite and inside the loudnorm ranges
pub fn validate_config(config: &BatchConfig) -> Result<(), ConfigError> {
    if config.workers.divisor == 0 {
        return Err(ConfigError::ValidationError(
            "workers.divisor cannot be 0".to_string(),
        ));
    }
    if config.workers.floor == 0 {
        return Err(ConfigError::ValidationError(
            "workers.floor cannot be 0".to_string(),
        ));
    }
    if config.workers.limit == Some(0) {
        return Err(ConfigError::ValidationError(
            "workers.limit cannot be 0".to_string(),
        ));
    }

    if config.cleanup.attempts == 0 {
        return Err(ConfigError::ValidationError(
            "cleanup.attempts cannot be 0".to_string(),
        ));
    }

    let loudness = &config.loudness;
    check_range("loudness.target", loudness.target, -70.0, -5.0)?;
    check_range("loudness.true_peak", loudness.true_peak, -9.0, 0.0)?;
    check_range("loudness.range", loudness.range, 1.0, 50.0)?;

    Ok(())
}

fn check_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ConfigError::ValidationError(format!(
            "{} must be between {} and {}, got {}",
            name, min, max, value
        )));
    }
    Ok(())
}
