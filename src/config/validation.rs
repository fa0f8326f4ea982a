//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject operation names the facade does not expose
//! - Validate value ranges (sampling fraction, sweep interval)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: CacheConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use tracing_subscriber::EnvFilter;

use super::schema::{CacheConfig, SamplerConfig, ALL_OPERATIONS};
use crate::operation::Operation;

/// A single semantic problem in a config file.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Check a parsed config, collecting every problem found.
pub fn validate_config(config: &CacheConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.engine.cleanup_interval_ms == Some(0) {
        errors.push(ValidationError::new(
            "engine.cleanup_interval_ms",
            "must be greater than zero (omit it to disable the janitor)",
        ));
    }

    let tracing = &config.tracing;
    if let Some(name) = &tracing.instance_name {
        if name.trim().is_empty() {
            errors.push(ValidationError::new("tracing.instance_name", "must not be empty"));
        }
    }

    if let SamplerConfig::Probability { fraction } = tracing.sampler {
        if !(0.0..=1.0).contains(&fraction) {
            errors.push(ValidationError::new(
                "tracing.sampler.fraction",
                format!("{fraction} is outside [0, 1]"),
            ));
        }
    }

    for (i, name) in tracing.operations.iter().enumerate() {
        if name != ALL_OPERATIONS && name.parse::<Operation>().is_err() {
            errors.push(ValidationError::new(
                format!("tracing.operations[{i}]"),
                format!("unknown cache operation `{name}`"),
            ));
        }
    }

    for (i, attribute) in tracing.default_attributes.iter().enumerate() {
        if attribute.key.is_empty() {
            errors.push(ValidationError::new(
                format!("tracing.default_attributes[{i}].key"),
                "must not be empty",
            ));
        }
    }

    if EnvFilter::try_new(&config.observability.log_level).is_err() {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("`{}` is not a valid filter directive", config.observability.log_level),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
