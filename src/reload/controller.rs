//! Reload state machine.
//!
//! # States
//! - Stopped: no process yet
//! - Running(committed): process up, serving `committed`
//!
//! # State Transitions
//! ```text
//! Stopped → Running(C):        write C, start, wait settle interval
//! Running(C) → Running(C'):    write C', signal, log says complete
//! Running(C) → Running(C):     write C', signal, log says error/timeout;
//!                              C rewritten to disk
//! Running(C) + C:              no-op
//! ```
//!
//! # Design Decisions
//! - At most one reload in flight: `apply` returns only once resolved
//! - The disk always ends up holding the committed aggregate

use std::path::PathBuf;
use std::time::Duration;

use crate::config::ServerConfig;
use crate::observability::metrics;
use crate::persistence::AggregateStore;
use crate::reload::log::LogFollower;
use crate::reload::outcome::{ReloadOutcome, Sentinels};
use crate::reload::process::ServerProcess;
use crate::reload::ReloadError;

/// Timing and log settings for reload confirmation.
#[derive(Debug, Clone)]
pub struct ReloadSettings {
    /// Wait after first start before treating the server as up.
    pub settle: Duration,
    /// Give up on a reload with no sentinel after this long.
    pub confirm_timeout: Duration,
    /// Server log to follow.
    pub log_path: PathBuf,
    /// Log polling interval.
    pub log_poll: Duration,
    pub sentinels: Sentinels,
}

impl From<&ServerConfig> for ReloadSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            settle: Duration::from_millis(config.settle_ms),
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            log_path: config.log_path.clone(),
            log_poll: Duration::from_millis(config.log_poll_ms),
            sentinels: Sentinels::new(&config.success_sentinel, &config.failure_sentinel),
        }
    }
}

#[derive(Debug)]
enum State {
    Stopped,
    Running { committed: String },
}

/// Owns the server process and the committed aggregate.
pub struct ReloadController<P> {
    store: AggregateStore,
    process: P,
    settings: ReloadSettings,
    state: State,
}

impl<P: ServerProcess> ReloadController<P> {
    pub fn new(store: AggregateStore, process: P, settings: ReloadSettings) -> Self {
        Self {
            store,
            process,
            settings,
            state: State::Stopped,
        }
    }

    /// The aggregate the server is known to be running, if started.
    pub fn committed(&self) -> Option<&str> {
        match &self.state {
            State::Stopped => None,
            State::Running { committed } => Some(committed),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running { .. })
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    /// Activate `candidate`.
    ///
    /// Returns `None` when it equals the committed aggregate. Errors mean the
    /// candidate could not even be attempted; the committed state is intact.
    pub async fn apply(&mut self, candidate: String) -> Result<Option<ReloadOutcome>, ReloadError> {
        let outcome = match &self.state {
            State::Stopped => self.start(candidate).await?,
            State::Running { committed } if *committed == candidate => {
                tracing::debug!("Aggregate unchanged, nothing to reload");
                return Ok(None);
            }
            State::Running { .. } => self.reload(candidate).await?,
        };
        metrics::record_reload(outcome);
        Ok(Some(outcome))
    }

    async fn start(&mut self, candidate: String) -> Result<ReloadOutcome, ReloadError> {
        self.store.write(&candidate).map_err(ReloadError::Write)?;
        self.process.start(self.store.path()).await?;

        // The log begins with the process, so there is nothing to confirm.
        tokio::time::sleep(self.settings.settle).await;

        tracing::info!(
            pid = self.process.id(),
            bytes = candidate.len(),
            "Server running with initial aggregate"
        );
        self.state = State::Running {
            committed: candidate,
        };
        Ok(ReloadOutcome::Started)
    }

    async fn reload(&mut self, candidate: String) -> Result<ReloadOutcome, ReloadError> {
        // Position before signalling so the reply cannot be missed.
        let mut follower =
            LogFollower::from_end(&self.settings.log_path, self.settings.log_poll).await;

        self.store.write(&candidate).map_err(ReloadError::Write)?;

        let outcome = match self.process.signal_reload().await {
            Ok(()) => Self::await_confirmation(&self.settings, &mut follower).await,
            Err(e) => {
                tracing::error!(error = %e, "Could not request reload");
                ReloadOutcome::ReloadFailed
            }
        };

        if outcome == ReloadOutcome::ReloadConfirmed {
            tracing::info!(bytes = candidate.len(), "Reload confirmed");
            self.state = State::Running {
                committed: candidate,
            };
        } else if let State::Running { committed } = &self.state {
            tracing::warn!("Reload failed, restoring last known good aggregate");
            self.store.write(committed).map_err(ReloadError::Write)?;
        }

        Ok(outcome)
    }

    async fn await_confirmation(
        settings: &ReloadSettings,
        follower: &mut LogFollower,
    ) -> ReloadOutcome {
        let sentinels = &settings.sentinels;
        let scan = async {
            loop {
                match follower.next_line().await {
                    Ok(line) => {
                        if let Some(outcome) = sentinels.classify(&line) {
                            tracing::debug!(line = %line, outcome = outcome.as_str(), "Reload sentinel");
                            return outcome;
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            path = %settings.log_path.display(),
                            error = %e,
                            "Failed to read server log"
                        );
                        return ReloadOutcome::ReloadFailed;
                    }
                }
            }
        };

        match tokio::time::timeout(settings.confirm_timeout, scan).await {
            Ok(outcome) => outcome,
            Err(_) => {
                tracing::warn!(
                    timeout_secs = settings.confirm_timeout.as_secs_f64(),
                    "No reload confirmation in server log"
                );
                ReloadOutcome::ReloadFailed
            }
        }
    }
}
