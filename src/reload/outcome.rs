//! Reload outcomes and the log sentinels that decide them.

use serde::Serialize;

/// Result of one activation of the backing server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadOutcome {
    /// The process was launched with the candidate.
    Started,
    /// The running process reported a successful reload.
    ReloadConfirmed,
    /// The reload was rejected, timed out, or could not be requested.
    ReloadFailed,
}

impl ReloadOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReloadOutcome::Started => "started",
            ReloadOutcome::ReloadConfirmed => "reload_confirmed",
            ReloadOutcome::ReloadFailed => "reload_failed",
        }
    }
}

/// Substrings the server logs after a reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentinels {
    pub success: String,
    pub failure: String,
}

impl Sentinels {
    pub fn new(success: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            success: success.into(),
            failure: failure.into(),
        }
    }

    /// Classify one log line. `None` means keep reading.
    ///
    /// A line carrying both sentinels counts as a failure.
    pub fn classify(&self, line: &str) -> Option<ReloadOutcome> {
        if line.contains(&self.failure) {
            Some(ReloadOutcome::ReloadFailed)
        } else if line.contains(&self.success) {
            Some(ReloadOutcome::ReloadConfirmed)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        let s = Sentinels::new("Reloading complete", "[ERROR] SIGUSR1");
        assert_eq!(
            s.classify("2024/01/01 12:00:00 [INFO] Reloading complete"),
            Some(ReloadOutcome::ReloadConfirmed)
        );
        assert_eq!(
            s.classify("2024/01/01 12:00:00 [ERROR] SIGUSR1: Caddyfile:3 - Error"),
            Some(ReloadOutcome::ReloadFailed)
        );
        assert_eq!(s.classify("2024/01/01 12:00:00 [INFO] Reloading"), None);
    }
}
