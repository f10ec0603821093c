//! Regeneration pipeline.
//!
//! # Responsibilities
//! - Wait for a coalesced pulse
//! - Synthesize, hand the new watch set over, apply the aggregate
//! - Publish status after every pass
//!
//! # Design Decisions
//! - Passes are strictly serialized: the next pulse is only taken once the
//!   previous reload has been confirmed or reverted
//! - Errors are logged; the loop never exits on its own except on shutdown

use tokio::sync::{broadcast, mpsc};

use crate::daemon::status::{ServerState, StatusHandle, SyncStatus};
use crate::observability::metrics;
use crate::reload::{ReloadController, ReloadOutcome, ServerProcess};
use crate::synthesis::RuleSet;
use crate::watch::{PulseReceiver, WatchSet};

/// Owns the rules and the reload controller; runs as one task.
pub struct Regenerator<P> {
    rules: RuleSet,
    reload: ReloadController<P>,
    watch_sets: mpsc::UnboundedSender<WatchSet>,
    status: StatusHandle,
    passes: u64,
    generation: u64,
    tenants: usize,
    watched_paths: usize,
}

impl<P: ServerProcess> Regenerator<P> {
    pub fn new(
        rules: RuleSet,
        reload: ReloadController<P>,
        watch_sets: mpsc::UnboundedSender<WatchSet>,
        status: StatusHandle,
    ) -> Self {
        Self {
            rules,
            reload,
            watch_sets,
            status,
            passes: 0,
            generation: 0,
            tenants: 0,
            watched_paths: 0,
        }
    }

    pub fn reload(&self) -> &ReloadController<P> {
        &self.reload
    }

    /// Activate a persisted aggregate as the starting point.
    pub async fn restore(&mut self, text: String) -> Option<ReloadOutcome> {
        tracing::info!(bytes = text.len(), "Activating persisted aggregate");
        let outcome = self.activate(text).await;
        self.publish(outcome);
        outcome
    }

    /// Run one synthesize → apply pass.
    pub async fn run_pass(&mut self) -> Option<ReloadOutcome> {
        let synthesis = self.rules.synthesize();
        self.passes += 1;
        self.tenants = synthesis.tenants;
        self.watched_paths = synthesis.watch_paths.len();
        metrics::record_pass(synthesis.tenants, synthesis.text.len());

        tracing::info!(
            pass = self.passes,
            tenants = synthesis.tenants,
            bytes = synthesis.text.len(),
            watched = self.watched_paths,
            "Regenerated aggregate"
        );

        if self.watch_sets.send(synthesis.watch_paths).is_err() {
            tracing::warn!("Watch controller is gone, changes will not be observed");
        }

        let outcome = self.activate(synthesis.text).await;
        self.publish(outcome);
        outcome
    }

    /// Process pulses until shutdown or until every pulse sender is gone.
    pub async fn run(mut self, mut pulses: PulseReceiver, mut shutdown: broadcast::Receiver<()>) {
        loop {
            tokio::select! {
                pulse = pulses.recv() => match pulse {
                    Some(()) => {
                        self.run_pass().await;
                    }
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Regenerator received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    async fn activate(&mut self, text: String) -> Option<ReloadOutcome> {
        match self.reload.apply(text).await {
            Ok(outcome) => {
                if matches!(
                    outcome,
                    Some(ReloadOutcome::Started | ReloadOutcome::ReloadConfirmed)
                ) {
                    self.generation += 1;
                }
                outcome
            }
            Err(e) => {
                tracing::error!(error = %e, "Activation failed, keeping current state");
                None
            }
        }
    }

    fn publish(&self, outcome: Option<ReloadOutcome>) {
        let previous = self.status.snapshot();
        let committed = self.reload.committed().unwrap_or_default();
        self.status.publish_committed(committed);
        self.status.publish(SyncStatus {
            server: if self.reload.is_running() {
                ServerState::Running
            } else {
                ServerState::Stopped
            },
            pid: self.reload.process().id(),
            passes: self.passes,
            generation: self.generation,
            tenants: self.tenants,
            watched_paths: self.watched_paths,
            last_outcome: outcome.or(previous.last_outcome),
            committed_bytes: committed.len(),
            updated_at: 0,
        });
    }
}
