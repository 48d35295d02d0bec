//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limit > 0)
//! - Check the log filter directive parses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: PlantConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use tracing_subscriber::EnvFilter;

use crate::config::schema::PlantConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("server.hostname must not be empty")]
    EmptyHostname,

    #[error("server.request_timeout_secs must be greater than zero")]
    ZeroTimeout,

    #[error("server.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("logging.level is not a valid filter directive: {0}")]
    InvalidLogLevel(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &PlantConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.hostname.trim().is_empty() {
        errors.push(ValidationError::EmptyHostname);
    }
    if config.server.request_timeout_secs == Some(0) {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.server.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }
    if EnvFilter::try_new(&config.logging.level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(config.logging.level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
