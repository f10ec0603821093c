//! Backing server process handle.
//!
//! # Responsibilities
//! - Launch the server once with the aggregate file
//! - Deliver the reload signal to the running process
//!
//! # Design Decisions
//! - Exactly one child; no restart policy
//! - Signals go through `kill(1)`, so any signal name it accepts works
//! - The child is killed when the handle is dropped

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::{Child, Command};

use crate::config::ServerConfig;
use crate::reload::ReloadError;

/// Control surface of the backing server.
#[async_trait]
pub trait ServerProcess: Send {
    /// Launch the server reading `config_path`.
    async fn start(&mut self, config_path: &Path) -> Result<(), ReloadError>;

    /// Ask the running server to reload its configuration.
    async fn signal_reload(&mut self) -> Result<(), ReloadError>;

    /// OS process id, if running.
    fn id(&self) -> Option<u32>;
}

/// A real child process.
#[derive(Debug)]
pub struct CaddyProcess {
    config: ServerConfig,
    child: Option<Child>,
}

impl CaddyProcess {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            child: None,
        }
    }

    /// Arguments with `{config}` and `{log}` filled in.
    pub fn expand_args(&self, config_path: &Path) -> Vec<String> {
        let config = config_path.to_string_lossy();
        let log = self.config.log_path.to_string_lossy();
        self.config
            .args
            .iter()
            .map(|arg| arg.replace("{config}", &config).replace("{log}", &log))
            .collect()
    }
}

#[async_trait]
impl ServerProcess for CaddyProcess {
    async fn start(&mut self, config_path: &Path) -> Result<(), ReloadError> {
        let args = self.expand_args(config_path);
        let child = Command::new(&self.config.program)
            .args(&args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| ReloadError::Spawn {
                program: self.config.program.clone(),
                source,
            })?;

        tracing::info!(
            program = %self.config.program,
            args = ?args,
            pid = child.id(),
            "Server process started"
        );
        self.child = Some(child);
        Ok(())
    }

    async fn signal_reload(&mut self) -> Result<(), ReloadError> {
        let child = self.child.as_mut().ok_or(ReloadError::NotRunning)?;
        if let Some(status) = child.try_wait().map_err(ReloadError::Wait)? {
            return Err(ReloadError::Exited(status));
        }
        let pid = child.id().ok_or(ReloadError::NotRunning)?;

        let signal = &self.config.reload_signal;
        let status = Command::new("kill")
            .arg(format!("-{signal}"))
            .arg(pid.to_string())
            .status()
            .await
            .map_err(|e| ReloadError::Signal {
                signal: signal.clone(),
                pid,
                reason: e.to_string(),
            })?;
        if !status.success() {
            return Err(ReloadError::Signal {
                signal: signal.clone(),
                pid,
                reason: format!("kill exited with {status}"),
            });
        }

        tracing::debug!(pid, signal = %signal, "Reload signal sent");
        Ok(())
    }

    fn id(&self) -> Option<u32> {
        self.child.as_ref().and_then(Child::id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_expand_args() {
        let config = ServerConfig {
            log_path: PathBuf::from("/var/log/caddy.log"),
            ..Default::default()
        };
        let process = CaddyProcess::new(config);
        assert_eq!(
            process.expand_args(Path::new("/etc/caddy.txt")),
            ["-conf", "/etc/caddy.txt", "-log", "/var/log/caddy.log"]
        );
    }

    #[tokio::test]
    async fn test_signal_without_start() {
        let mut process = CaddyProcess::new(ServerConfig::default());
        assert!(matches!(
            process.signal_reload().await,
            Err(ReloadError::NotRunning)
        ));
        assert_eq!(process.id(), None);
    }

    #[tokio::test]
    async fn test_spawn_failure() {
        let config = ServerConfig {
            program: "/nonexistent/caddy-binary".into(),
            ..Default::default()
        };
        let mut process = CaddyProcess::new(config);
        let err = process.start(Path::new("caddy.txt")).await.unwrap_err();
        assert!(matches!(err, ReloadError::Spawn { .. }));
    }
}
