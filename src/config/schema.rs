//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// Rewrite rules, applied in order.
    pub rules: Vec<RuleConfig>,

    /// Backing server process settings.
    pub server: ServerConfig,

    /// Where the aggregate is written.
    pub output: OutputConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin API settings.
    pub admin: AdminConfig,
}

/// One rewrite rule as written in the config file or on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RuleConfig {
    /// Glob resolving to directories whose children are tenants.
    pub source: String,

    /// Host rewrite, `"<match>:<replacement>"`.
    pub pattern: String,

    /// Fragment used for tenants without their own.
    #[serde(default)]
    pub default_template: Option<PathBuf>,
}

/// Backing server process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Executable to launch.
    pub program: String,

    /// Arguments. `{config}` and `{log}` are replaced with the aggregate
    /// and log paths.
    pub args: Vec<String>,

    /// Log file the server writes to.
    pub log_path: PathBuf,

    /// Signal name sent to request a reload (as understood by `kill`).
    pub reload_signal: String,

    /// Log substring marking a successful reload.
    pub success_sentinel: String,

    /// Log substring marking a failed reload.
    pub failure_sentinel: String,

    /// How long to wait after the first start before assuming it is up.
    pub settle_ms: u64,

    /// How long to wait for a sentinel after a reload signal.
    pub confirm_timeout_secs: u64,

    /// How often the log file is polled for new lines.
    pub log_poll_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            program: "caddy".to_string(),
            args: vec![
                "-conf".to_string(),
                "{config}".to_string(),
                "-log".to_string(),
                "{log}".to_string(),
            ],
            log_path: PathBuf::from("caddy.log"),
            reload_signal: "USR1".to_string(),
            success_sentinel: "Reloading complete".to_string(),
            failure_sentinel: "[ERROR] SIGUSR1".to_string(),
            settle_ms: 1000,
            confirm_timeout_secs: 30,
            log_poll_ms: 100,
        }
    }
}

/// Output location of the aggregate.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Aggregate file handed to the server; also the last-known-good copy.
    pub aggregate_path: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            aggregate_path: PathBuf::from("caddy.txt"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins if set.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the admin API.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Admin API bind address.
    pub bind_address: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            bind_address: "127.0.0.1:8081".to_string(),
        }
    }
}
