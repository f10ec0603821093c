//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every rewrite rule can be built
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SyncConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::SyncConfig;
use crate::synthesis::{RewriteRule, RuleError};

/// A single semantic problem in the configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("no rewrite rules configured")]
    NoRules,

    #[error("rule #{index}: {source}")]
    Rule {
        index: usize,
        #[source]
        source: RuleError,
    },

    #[error("server.{field} must not be empty")]
    Empty { field: &'static str },

    #[error("server.{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("success and failure sentinels must differ")]
    SameSentinels,

    #[error("{field} '{value}' is not a valid socket address")]
    Address { field: &'static str, value: String },
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &SyncConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.rules.is_empty() {
        errors.push(ValidationError::NoRules);
    }
    for (index, rule) in config.rules.iter().enumerate() {
        if let Err(source) = RewriteRule::try_from(rule) {
            errors.push(ValidationError::Rule { index, source });
        }
    }

    let server = &config.server;
    for (field, value) in [
        ("program", &server.program),
        ("reload_signal", &server.reload_signal),
        ("success_sentinel", &server.success_sentinel),
        ("failure_sentinel", &server.failure_sentinel),
    ] {
        if value.trim().is_empty() {
            errors.push(ValidationError::Empty { field });
        }
    }
    if server.success_sentinel == server.failure_sentinel {
        errors.push(ValidationError::SameSentinels);
    }
    if server.confirm_timeout_secs == 0 {
        errors.push(ValidationError::Zero {
            field: "confirm_timeout_secs",
        });
    }
    if server.log_poll_ms == 0 {
        errors.push(ValidationError::Zero { field: "log_poll_ms" });
    }

    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.admin.enabled {
        check_address(&mut errors, "admin.bind_address", &config.admin.bind_address);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::Address {
            field,
            value: value.to_string(),
        });
    }
}
