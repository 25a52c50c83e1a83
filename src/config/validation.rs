use std::str::FromStr;
use tracing_subscriber::filter::LevelFilter;

use super::Config;

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let weights = [
        ("compatibility", config.weights.compatibility),
        ("success", config.weights.success),
        ("preference", config.weights.preference),
    ];
    for (name, value) in weights {
        if !value.is_finite() || value < 0.0 {
            errors.push(format!("weights.{}: must be a non-negative number, got {}", name, value));
        }
    }

    if config.limit == 0 {
        errors.push("limit: must be at least 1".to_string());
    }

    if LevelFilter::from_str(&config.log_level).is_err() {
        errors.push(format!(
            "log_level: invalid '{}' - expected one of off, error, warn, info, debug, trace",
            config.log_level
        ));
    }

    let training = &config.training;
    if training.estimators == 0 {
        errors.push("training.estimators: must be at least 1".to_string());
    }
    if !(training.learning_rate > 0.0 && training.learning_rate <= 1.0) {
        errors.push(format!(
            "training.learning_rate: must be in (0, 1], got {}",
            training.learning_rate
        ));
    }
    if training.max_depth == 0 {
        errors.push("training.max_depth: must be at least 1".to_string());
    }
    if training.min_samples_leaf == 0 {
        errors.push("training.min_samples_leaf: must be at least 1".to_string());
    }
    if !(training.validation_fraction >= 0.0 && training.validation_fraction < 1.0) {
        errors.push(format!(
            "training.validation_fraction: must be in [0, 1), got {}",
            training.validation_fraction
        ));
    }
    if training.min_examples < 2 {
        errors.push("training.min_examples: must be at least 2".to_string());
    }
    match training.timeout() {
        Ok(timeout) if timeout.is_zero() => {
            errors.push("training.timeout: must be greater than zero".to_string())
        }
        Ok(_) => {}
        Err(e) => errors.push(format!(
            "training.timeout: invalid '{}' - {}",
            training.timeout, e
        )),
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
