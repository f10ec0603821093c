//! Server reload subsystem.
//!
//! # Data Flow
//! ```text
//! candidate aggregate
//!     → controller.rs (diff against committed)
//!     → persistence (write candidate)
//!     → process.rs (start, or send reload signal)
//!     → log.rs (follow server log from before the signal)
//!     → outcome.rs (sentinel → confirmed / failed)
//!     → commit, or rewrite committed aggregate to disk
//! ```
//!
//! # Design Decisions
//! - Single owner of the process handle and the aggregate file
//! - Failures are absorbed: the server keeps its last good config

pub mod controller;
pub mod log;
pub mod outcome;
pub mod process;

use std::io;
use std::process::ExitStatus;

use thiserror::Error;

pub use controller::{ReloadController, ReloadSettings};
pub use outcome::{ReloadOutcome, Sentinels};
pub use process::{CaddyProcess, ServerProcess};

/// Errors that stop an activation before an outcome exists.
#[derive(Debug, Error)]
pub enum ReloadError {
    /// Writing the aggregate file failed.
    #[error("failed to write aggregate: {0}")]
    Write(#[source] io::Error),

    /// The server could not be launched.
    #[error("failed to start '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// No process has been started.
    #[error("server process is not running")]
    NotRunning,

    /// The process exited on its own.
    #[error("server process exited with {0}")]
    Exited(ExitStatus),

    /// Polling the child's status failed.
    #[error("failed to query server process: {0}")]
    Wait(#[source] io::Error),

    /// The reload signal could not be delivered.
    #[error("failed to send SIG{signal} to pid {pid}: {reason}")]
    Signal {
        signal: String,
        pid: u32,
        reason: String,
    },
}
