//! Multi-tenant Caddyfile aggregator library.

pub mod admin;
pub mod caddyfile;
pub mod config;
pub mod daemon;
pub mod lifecycle;
pub mod observability;
pub mod persistence;
pub mod reload;
pub mod synthesis;
pub mod watch;

pub use config::schema::SyncConfig;
pub use daemon::Daemon;
pub use lifecycle::Shutdown;
