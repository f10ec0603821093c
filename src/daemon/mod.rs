//! Daemon wiring.
//!
//! # Data Flow
//! ```text
//! SyncConfig
//!     → Daemon::new (RuleSet built; malformed rules abort here)
//!     → Daemon::run:
//!         WatchController task ──pulse──▶ Regenerator task
//!                ▲                             │
//!                └────────── WatchSet ─────────┘
//!         Regenerator → ReloadController → server process
//!         StatusHandle → admin API (optional)
//! ```
//!
//! # Design Decisions
//! - Nothing is spawned until every rule has been built
//! - A persisted aggregate is activated before the first pass

pub mod pipeline;
pub mod status;

use std::io;
use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use crate::admin::{self, AdminState};
use crate::config::validation::{validate_config, ValidationError};
use crate::config::SyncConfig;
use crate::lifecycle::Shutdown;
use crate::persistence::AggregateStore;
use crate::reload::{CaddyProcess, ReloadController, ReloadSettings};
use crate::synthesis::{RuleError, RuleSet};
use crate::watch::{pulse, WatchController};

pub use pipeline::Regenerator;
pub use status::{ServerState, StatusHandle, SyncStatus};

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Rule(#[from] RuleError),

    #[error("failed to bind admin API on {addr}: {source}")]
    AdminBind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

/// A configured, not yet running daemon.
pub struct Daemon {
    config: SyncConfig,
    rules: RuleSet,
    status: StatusHandle,
}

impl Daemon {
    /// Validate the config and build every rewrite rule.
    pub fn new(config: SyncConfig) -> Result<Self, StartupError> {
        validate_config(&config).map_err(StartupError::Validation)?;
        let rules = RuleSet::from_configs(&config.rules)?;
        Ok(Self {
            config,
            rules,
            status: StatusHandle::new(),
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn status(&self) -> StatusHandle {
        self.status.clone()
    }

    /// Synthesize once without touching disk or processes.
    pub fn render(&self) -> String {
        self.rules.render_once()
    }

    /// Run until `shutdown` fires.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), StartupError> {
        let Daemon {
            config,
            rules,
            status,
        } = self;

        let regen_shutdown = shutdown.subscribe();
        let (pulse_tx, pulse_rx) = pulse::channel();
        let (sets_tx, sets_rx) = mpsc::unbounded_channel();

        if config.admin.enabled {
            let addr: SocketAddr = config.admin.bind_address.parse().map_err(|e| {
                StartupError::AdminBind {
                    addr: config.admin.bind_address.clone(),
                    source: io::Error::new(io::ErrorKind::InvalidInput, e),
                }
            })?;
            let listener = TcpListener::bind(addr)
                .await
                .map_err(|source| StartupError::AdminBind {
                    addr: addr.to_string(),
                    source,
                })?;
            let state = AdminState::new(status.clone(), &config.admin.api_key, &rules);
            let admin_shutdown = shutdown.subscribe();
            tokio::spawn(async move {
                if let Err(e) = admin::serve(listener, state, admin_shutdown).await {
                    tracing::error!(error = %e, "Admin API failed");
                }
            });
        }

        let watcher = WatchController::new(pulse_tx.clone(), sets_rx);
        let watch_task = tokio::spawn(watcher.run(shutdown.subscribe()));

        let store = AggregateStore::new(&config.output.aggregate_path);
        let persisted = match store.load() {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(
                    path = %store.path().display(),
                    error = %e,
                    "Cannot read persisted aggregate, starting fresh"
                );
                None
            }
        };

        let reload = ReloadController::new(
            store,
            CaddyProcess::new(config.server.clone()),
            ReloadSettings::from(&config.server),
        );
        let mut regenerator = Regenerator::new(rules, reload, sets_tx, status);

        if let Some(text) = persisted {
            regenerator.restore(text).await;
        }

        pulse_tx.trigger();
        regenerator.run(pulse_rx, regen_shutdown).await;

        let _ = watch_task.await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleConfig;

    #[test]
    fn test_malformed_pattern_aborts_startup() {
        let mut config = SyncConfig::default();
        config.rules.push(RuleConfig {
            source: "/srv/*".into(),
            pattern: "example.com".into(),
            default_template: None,
        });

        match Daemon::new(config) {
            Err(StartupError::Validation(errors)) => {
                assert!(matches!(
                    errors[0],
                    ValidationError::Rule {
                        source: RuleError::MalformedPattern { .. },
                        ..
                    }
                ));
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("malformed pattern accepted"),
        }
    }
}
