//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Read config → Merge --remap rules → Validate
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Broadcast → Watcher, regenerator and admin API exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The server child is killed when the reload controller drops

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
