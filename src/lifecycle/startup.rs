//! Startup configuration assembly.
//!
//! # Responsibilities
//! - Read the optional config file
//! - Append rules given as `--remap GLOB,PATTERN[,DEFAULT]`
//! - Validate the merged result
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - File rules come first, command-line rules after, in order given

use std::path::{Path, PathBuf};

use crate::config::loader::read_config;
use crate::config::validation::validate_config;
use crate::config::{ConfigError, RuleConfig, SyncConfig};

/// Parse one `--remap` value.
pub fn parse_remap(value: &str) -> Result<RuleConfig, String> {
    let parts: Vec<&str> = value.split(',').collect();
    match parts.as_slice() {
        [source, pattern] => Ok(RuleConfig {
            source: source.to_string(),
            pattern: pattern.to_string(),
            default_template: None,
        }),
        [source, pattern, default] => Ok(RuleConfig {
            source: source.to_string(),
            pattern: pattern.to_string(),
            default_template: Some(PathBuf::from(default)),
        }),
        _ => Err(format!(
            "expected GLOB,PATTERN[,DEFAULT], got {} comma-separated parts",
            parts.len()
        )),
    }
}

/// Build the effective configuration.
pub fn build_config(
    path: Option<&Path>,
    remaps: Vec<RuleConfig>,
) -> Result<SyncConfig, ConfigError> {
    let mut config = match path {
        Some(path) => read_config(path)?,
        None => SyncConfig::default(),
    };
    config.rules.extend(remaps);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}
