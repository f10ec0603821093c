//! Rewrite rules.
//!
//! # Responsibilities
//! - Parse `"match:replacement"` host patterns
//! - Validate source globs up front
//! - Rewrite site keys for one tenant
//!
//! # Design Decisions
//! - Construction is the only place a rule can fail; a rule that exists
//!   is always usable during synthesis
//! - `@N` placeholders count path segments from the deepest one (`@1`)

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use thiserror::Error;

use crate::config::RuleConfig;

/// Separator between the host match and its replacement.
pub const PATTERN_SEPARATOR: char = ':';

/// Errors raised while building a rule.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    /// The host pattern did not split into exactly two parts.
    #[error("incorrect pattern '{pattern}': expected '<match>{sep}<replacement>', found {parts} part(s)", sep = PATTERN_SEPARATOR)]
    MalformedPattern { pattern: String, parts: usize },

    /// The source glob is empty or not a valid glob.
    #[error("invalid source glob '{glob}': {reason}")]
    InvalidGlob { glob: String, reason: String },
}

/// Host rewrite: replace the first occurrence of `host_match` with
/// `replacement` in every site key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPattern {
    pub host_match: String,
    pub replacement: String,
}

impl FromStr for HostPattern {
    type Err = RuleError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = pattern.split(PATTERN_SEPARATOR).collect();
        match parts.as_slice() {
            [host_match, replacement] => Ok(Self {
                host_match: host_match.to_string(),
                replacement: replacement.to_string(),
            }),
            _ => Err(RuleError::MalformedPattern {
                pattern: pattern.to_string(),
                parts: parts.len(),
            }),
        }
    }
}

impl fmt::Display for HostPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.host_match, PATTERN_SEPARATOR, self.replacement)
    }
}

/// One rewrite rule: where to find tenants and how to rewrite their keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRule {
    source_glob: String,
    pattern: HostPattern,
    default_template: Option<PathBuf>,
}

impl RewriteRule {
    /// Build a rule, rejecting malformed patterns and globs.
    pub fn new(
        source_glob: impl Into<String>,
        pattern: &str,
        default_template: Option<PathBuf>,
    ) -> Result<Self, RuleError> {
        let source_glob = source_glob.into();
        if source_glob.trim().is_empty() {
            return Err(RuleError::InvalidGlob {
                glob: source_glob,
                reason: "empty".to_string(),
            });
        }
        if let Err(e) = glob::Pattern::new(&source_glob) {
            return Err(RuleError::InvalidGlob {
                glob: source_glob,
                reason: e.to_string(),
            });
        }

        Ok(Self {
            source_glob,
            pattern: pattern.parse()?,
            default_template: default_template.filter(|p| !p.as_os_str().is_empty()),
        })
    }

    pub fn source_glob(&self) -> &str {
        &self.source_glob
    }

    pub fn pattern(&self) -> &HostPattern {
        &self.pattern
    }

    pub fn default_template(&self) -> Option<&Path> {
        self.default_template.as_deref()
    }

    /// Rewrite one site key for the tenant at `tenant_path`.
    ///
    /// First the host match is replaced once, then every `@N` placeholder is
    /// replaced once with the N-th path segment counted from the end. An empty
    /// host match matches at the start, so the replacement becomes a prefix.
    pub fn rewrite_key(&self, key: &str, tenant_path: &Path) -> String {
        let mut key = key.replacen(&self.pattern.host_match, &self.pattern.replacement, 1);

        let segments: Vec<String> = tenant_path
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        // Farthest first, so `@12` is consumed before `@1` can match its prefix.
        for (i, segment) in segments.iter().enumerate() {
            let placeholder = format!("@{}", segments.len() - i);
            key = key.replacen(&placeholder, segment, 1);
        }

        key
    }
}

impl TryFrom<&RuleConfig> for RewriteRule {
    type Error = RuleError;

    fn try_from(config: &RuleConfig) -> Result<Self, Self::Error> {
        Self::new(
            config.source.clone(),
            &config.pattern,
            config.default_template.clone(),
        )
    }
}
