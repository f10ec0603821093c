//! Filesystem watcher for tenant trees.
//!
//! # Responsibilities
//! - Own the `notify` watcher and its registrations
//! - Classify raw events as relevant or noise
//! - Turn relevant events into a coalesced regenerate pulse
//! - Rebuild registrations from scratch after every pass

use notify::event::{ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::caddyfile::FRAGMENT_FILE_NAME;
use crate::observability::metrics;
use crate::watch::pulse::PulseSender;
use crate::watch::set::WatchSet;

/// Decide whether an event must trigger regeneration.
///
/// Removals, and renames away from a path, always count. Everything else,
/// renames onto a path included, counts only for directories and fragment
/// files, so the aggregate's own temp-file rename stays quiet.
pub fn should_regenerate(event: &Event) -> bool {
    match &event.kind {
        EventKind::Remove(_) => true,
        EventKind::Modify(ModifyKind::Name(RenameMode::From | RenameMode::Any)) => true,
        EventKind::Access(_) => false,
        _ => event.paths.iter().any(|path| {
            path.file_name().is_some_and(|n| n == FRAGMENT_FILE_NAME) || path.is_dir()
        }),
    }
}

/// Owns the watcher; runs as its own task.
pub struct WatchController {
    pulse: PulseSender,
    sets: mpsc::UnboundedReceiver<WatchSet>,
    events_tx: mpsc::UnboundedSender<notify::Result<Event>>,
    events_rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    _watcher: Option<RecommendedWatcher>,
    watched: WatchSet,
}

impl WatchController {
    /// Create a controller that pulses `pulse` and takes new watch sets
    /// from `sets`.
    pub fn new(pulse: PulseSender, sets: mpsc::UnboundedReceiver<WatchSet>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            pulse,
            sets,
            events_tx,
            events_rx,
            _watcher: None,
            watched: WatchSet::new(),
        }
    }

    /// Paths registered by the last rebuild.
    pub fn watched(&self) -> &WatchSet {
        &self.watched
    }

    /// Run until shutdown or until the watch-set sender is dropped.
    pub async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("Watch controller started");

        loop {
            tokio::select! {
                Some(res) = self.events_rx.recv() => {
                    self.handle(res);
                }
                set = self.sets.recv() => match set {
                    Some(set) => {
                        self.rebuild(set);
                    }
                    None => break,
                },
                _ = shutdown.recv() => {
                    tracing::info!("Watch controller received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Handle one raw notification. Returns `true` if it queued a pulse.
    pub fn handle(&self, res: notify::Result<Event>) -> bool {
        match res {
            Ok(event) => {
                if !should_regenerate(&event) {
                    tracing::trace!(kind = ?event.kind, paths = ?event.paths, "Ignoring event");
                    return false;
                }
                let queued = self.pulse.trigger();
                tracing::debug!(
                    kind = ?event.kind,
                    paths = ?event.paths,
                    queued,
                    "Change detected"
                );
                queued
            }
            Err(e) => {
                tracing::error!(error = %e, "Watch error");
                false
            }
        }
    }

    /// Replace the watcher with a fresh one observing exactly `set`.
    ///
    /// Returns how many paths were registered.
    pub fn rebuild(&mut self, set: WatchSet) -> usize {
        let tx = self.events_tx.clone();
        let mut watcher = match RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let _ = tx.send(res);
            },
            Config::default(),
        ) {
            Ok(w) => w,
            Err(e) => {
                tracing::error!(error = %e, "Failed to create watcher, keeping previous registrations");
                return 0;
            }
        };

        let mut registered = 0;
        for path in set.iter() {
            match watcher.watch(path, RecursiveMode::NonRecursive) {
                Ok(()) => registered += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to watch path");
                }
            }
        }

        // Dropping the old watcher removes every stale registration.
        self._watcher = Some(watcher);
        self.watched = set;
        metrics::record_watched_paths(registered);
        tracing::debug!(registered, requested = self.watched.len(), "Watch set rebuilt");
        registered
    }
}
