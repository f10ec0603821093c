//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use multi_caddy::persistence::AggregateStore;
use multi_caddy::reload::{ReloadController, ReloadError, ReloadSettings, Sentinels, ServerProcess};

pub const SUCCESS: &str = "Reloading complete";
pub const FAILURE: &str = "[ERROR] SIGUSR1";

/// A temporary tree of tenant directories.
pub struct TenantTree {
    dir: TempDir,
}

impl TenantTree {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Create `<root>/<name>` and, if given, its fragment. Returns the
    /// tenant directory.
    pub fn tenant(&self, root: &str, name: &str, fragment: Option<&str>) -> PathBuf {
        let dir = self.path().join(root).join(name);
        fs::create_dir_all(&dir).unwrap();
        if let Some(text) = fragment {
            fs::write(dir.join("Caddyfile"), text).unwrap();
        }
        dir
    }

    /// Glob source for everything directly under `<root>`.
    pub fn source(&self, root: &str) -> String {
        self.path().join(root).to_string_lossy().into_owned()
    }

    pub fn file(&self, name: &str, text: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, text).unwrap();
        path
    }
}

/// What the scripted server does when asked to reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Confirm,
    Fail,
    Silent,
    SignalError,
}

/// A fake server that answers reloads from a script by appending to its log.
#[derive(Debug)]
pub struct ScriptedProcess {
    pub log_path: PathBuf,
    pub replies: VecDeque<Reply>,
    pub fail_start: bool,
    pub config_path: Option<PathBuf>,
    pub starts: usize,
    pub signals: usize,
    /// Aggregate contents observed at each start or signal.
    pub seen: Vec<String>,
}

impl ScriptedProcess {
    pub fn new(log_path: impl Into<PathBuf>) -> Self {
        Self {
            log_path: log_path.into(),
            replies: VecDeque::new(),
            fail_start: false,
            config_path: None,
            starts: 0,
            signals: 0,
            seen: Vec::new(),
        }
    }

    pub fn reply(mut self, reply: Reply) -> Self {
        self.replies.push_back(reply);
        self
    }

    fn log(&self, line: &str) {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .unwrap();
        writeln!(file, "{line}").unwrap();
    }

    fn observe(&mut self) {
        if let Some(path) = &self.config_path {
            self.seen.push(fs::read_to_string(path).unwrap_or_default());
        }
    }
}

#[async_trait]
impl ServerProcess for ScriptedProcess {
    async fn start(&mut self, config_path: &Path) -> Result<(), ReloadError> {
        if self.fail_start {
            return Err(ReloadError::Spawn {
                program: "scripted".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted failure"),
            });
        }
        self.config_path = Some(config_path.to_path_buf());
        self.starts += 1;
        self.observe();
        self.log("serving");
        Ok(())
    }

    async fn signal_reload(&mut self) -> Result<(), ReloadError> {
        self.signals += 1;
        self.observe();
        match self.replies.pop_front().unwrap_or(Reply::Confirm) {
            Reply::Confirm => self.log(&format!("2026/01/01 00:00:00 {SUCCESS}")),
            Reply::Fail => self.log(&format!("2026/01/01 00:00:00 {FAILURE}: bad directive")),
            Reply::Silent => self.log("unrelated chatter"),
            Reply::SignalError => {
                return Err(ReloadError::Signal {
                    signal: "USR1".into(),
                    pid: 4242,
                    reason: "scripted".into(),
                })
            }
        }
        Ok(())
    }

    fn id(&self) -> Option<u32> {
        (self.starts > 0).then_some(4242)
    }
}

/// Fast timings for tests.
pub fn settings(log_path: &Path) -> ReloadSettings {
    ReloadSettings {
        settle: Duration::ZERO,
        confirm_timeout: Duration::from_millis(300),
        log_path: log_path.to_path_buf(),
        log_poll: Duration::from_millis(10),
        sentinels: Sentinels::new(SUCCESS, FAILURE),
    }
}

/// A controller over a scripted process, writing into `dir`.
pub fn controller(dir: &Path, process: ScriptedProcess) -> ReloadController<ScriptedProcess> {
    let log_path = process.log_path.clone();
    ReloadController::new(
        AggregateStore::new(dir.join("caddy.txt")),
        process,
        settings(&log_path),
    )
}
