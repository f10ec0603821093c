//! Configuration synthesis subsystem.
//!
//! # Data Flow
//! ```text
//! RuleSet (ordered RewriteRules)
//!     → scanner.rs (glob → root dirs → tenant dirs)
//!     → rewriter.rs (fragment or template → rewritten blocks)
//!     → ruleset.rs (concatenate in rule order)
//!     → Synthesis { aggregate text, watch set }
//! ```
//!
//! # Design Decisions
//! - Passes are sequential and stateless; each one rescans the tree
//! - Output is byte-identical for an unchanged tree
//! - Rule errors surface at construction, tenant errors are absorbed

pub mod rewriter;
pub mod rule;
pub mod ruleset;
pub mod scanner;

pub use rule::{HostPattern, RewriteRule, RuleError};
pub use ruleset::{RuleSet, Synthesis};
pub use scanner::TenantDirectory;
