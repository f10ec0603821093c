//! Fragment grammar subsystem.
//!
//! # Data Flow
//! ```text
//! tenant Caddyfile (raw text)
//!     → lexer.rs (tokens with source lines)
//!     → parser.rs (ServerBlock: keys + directive groups)
//!     → [rewritten by synthesis]
//!     → writer.rs (line-sorted, byte-stable text)
//! ```
//!
//! # Design Decisions
//! - Only the structure needed for rewriting is modelled; directive
//!   semantics belong to the backing server
//! - No `import` expansion or placeholder substitution

pub mod lexer;
pub mod parser;
pub mod writer;

pub use lexer::Token;
pub use parser::{parse, ParseError, ServerBlock};
pub use writer::serialize_block;

/// File name each tenant directory may carry its own fragment under.
pub const FRAGMENT_FILE_NAME: &str = "Caddyfile";
