//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, port != 0)
//! - Make sure the write timeout outlasts every streaming demo
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: DumpConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::DumpConfig;
use crate::http::stream::StreamPlan;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.address must not be empty")]
    EmptyAddress,

    #[error("listener.port must not be 0")]
    ZeroPort,

    #[error("timeouts.{0}_ms must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("timeouts.write_ms ({write_ms}) must exceed the longest stream ({stream_ms}ms)")]
    WriteTimeoutTooShort { write_ms: u64, stream_ms: u64 },

    #[error("limits.max_body_bytes must be greater than 0")]
    ZeroBodyLimit,
}

pub fn validate_config(config: &DumpConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress);
    }
    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    if config.timeouts.read_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("read"));
    }
    if config.timeouts.write_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("write"));
    } else {
        let stream_ms = StreamPlan::longest_duration().as_millis() as u64;
        if config.timeouts.write_ms <= stream_ms {
            errors.push(ValidationError::WriteTimeoutTooShort {
                write_ms: config.timeouts.write_ms,
                stream_ms,
            });
        }
    }

    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&DumpConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = DumpConfig::default();
        config.listener.address = " ".into();
        config.listener.port = 0;
        config.timeouts.read_ms = 0;
        config.limits.max_body_bytes = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyAddress,
                ValidationError::ZeroPort,
                ValidationError::ZeroTimeout("read"),
                ValidationError::ZeroBodyLimit,
            ]
        );
    }

    #[test]
    fn test_write_timeout_must_outlast_fizzbuzz() {
        let mut config = DumpConfig::default();
        config.timeouts.write_ms = 4_500;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![ValidationError::WriteTimeoutTooShort {
                write_ms: 4_500,
                stream_ms: 4_500,
            }]
        );

        config.timeouts.write_ms = 4_501;
        assert!(validate_config(&config).is_ok());
    }
}
