//! Filesystem watch subsystem.
//!
//! # Data Flow
//! ```text
//! notify callback (watcher thread)
//!     → controller.rs (classify: dir / fragment / removal)
//!     → pulse.rs (single-slot, extra triggers are no-ops)
//!     → regeneration task
//!
//! After each pass:
//!     Synthesis.watch_paths (set.rs)
//!     → controller.rs drops the old watcher, registers the new set
//! ```
//!
//! # Design Decisions
//! - One pulse per burst, never one pass per event
//! - Registrations are rebuilt, not patched
//! - Watch errors are logged; other paths keep working

pub mod controller;
pub mod pulse;
pub mod set;

pub use controller::{should_regenerate, WatchController};
pub use pulse::{PulseReceiver, PulseSender};
pub use set::WatchSet;
