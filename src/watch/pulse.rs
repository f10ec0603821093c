//! Single-slot regenerate signal.
//!
//! Any number of triggers before the receiver wakes collapse into one pulse.

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Create a connected pulse pair.
pub fn channel() -> (PulseSender, PulseReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (PulseSender { tx }, PulseReceiver { rx })
}

/// Sending half. Cheap to clone.
#[derive(Debug, Clone)]
pub struct PulseSender {
    tx: mpsc::Sender<()>,
}

impl PulseSender {
    /// Request a regeneration pass.
    ///
    /// Returns `true` if this call queued a new pulse, `false` if one was
    /// already pending (or the receiver is gone).
    pub fn trigger(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => false,
            Err(TrySendError::Closed(())) => {
                tracing::debug!("Regenerate pulse dropped: receiver closed");
                false
            }
        }
    }
}

/// Receiving half, owned by the regeneration task.
#[derive(Debug)]
pub struct PulseReceiver {
    rx: mpsc::Receiver<()>,
}

impl PulseReceiver {
    /// Wait for the next pulse. `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Take a pending pulse without waiting.
    pub fn try_recv(&mut self) -> bool {
        self.rx.try_recv().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_coalesce() {
        let (tx, mut rx) = channel();
        assert!(tx.trigger());
        assert!(!tx.trigger());
        assert!(!tx.clone().trigger());

        assert!(rx.try_recv());
        assert!(!rx.try_recv());

        assert!(tx.trigger());
        assert!(rx.try_recv());
    }

    #[tokio::test]
    async fn test_recv_ends_when_senders_dropped() {
        let (tx, mut rx) = channel();
        tx.trigger();
        drop(tx);
        assert_eq!(rx.recv().await, Some(()));
        assert_eq!(rx.recv().await, None);
    }
}
