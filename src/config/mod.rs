//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + --remap flags
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, incl. every rewrite rule)
//!     → SyncConfig (validated, immutable)
//!     → Daemon builds RuleSet / ReloadController from it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; rules never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::AdminConfig;
pub use schema::LogFormat;
pub use schema::ObservabilityConfig;
pub use schema::OutputConfig;
pub use schema::RuleConfig;
pub use schema::ServerConfig;
pub use schema::SyncConfig;
