//! Shared status snapshot.
//!
//! Written only by the regeneration task, read lock-free by the admin API.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::reload::ReloadOutcome;

/// Lifecycle of the backing server as seen by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ServerState {
    #[default]
    Stopped,
    Running,
}

/// Point-in-time view of the daemon.
#[derive(Debug, Clone, Serialize, Default)]
pub struct SyncStatus {
    pub server: ServerState,
    pub pid: Option<u32>,
    /// Regeneration passes run so far.
    pub passes: u64,
    /// Aggregates committed so far (first start included).
    pub generation: u64,
    pub tenants: usize,
    pub watched_paths: usize,
    pub last_outcome: Option<ReloadOutcome>,
    pub committed_bytes: usize,
    /// Unix seconds of the last update.
    pub updated_at: u64,
}

/// Cheap-to-clone handle on the latest status and committed aggregate.
#[derive(Debug, Clone, Default)]
pub struct StatusHandle {
    status: Arc<ArcSwap<SyncStatus>>,
    committed: Arc<ArcSwap<String>>,
}

impl StatusHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> Arc<SyncStatus> {
        self.status.load_full()
    }

    /// The committed aggregate text (empty before first start).
    pub fn committed(&self) -> Arc<String> {
        self.committed.load_full()
    }

    pub(crate) fn publish(&self, mut status: SyncStatus) {
        status.updated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        self.status.store(Arc::new(status));
    }

    pub(crate) fn publish_committed(&self, text: &str) {
        if self.committed.load().as_str() != text {
            self.committed.store(Arc::new(text.to_string()));
        }
    }
}
