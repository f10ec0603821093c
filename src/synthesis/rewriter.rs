//! Per-tenant block rewriting.
//!
//! # Responsibilities
//! - Pick the fragment source (tenant file, else fallback template)
//! - Rewrite site keys through the rule
//! - Inject a `root` directive pointing into the tenant directory
//! - Serialize each block deterministically
//!
//! # Design Decisions
//! - A broken or unreadable fragment only blanks its own tenant; the
//!   template stands in only when the tenant has no fragment at all
//! - The watch path is the fragment file if it exists, else the tenant
//!   directory (so a new fragment is noticed)

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::caddyfile::{self, ParseError, ServerBlock, Token};
use crate::synthesis::rule::RewriteRule;
use crate::synthesis::scanner::TenantDirectory;

const ROOT_DIRECTIVE: &str = "root";

/// Rewritten output for one tenant.
#[derive(Debug, Default)]
pub struct TenantOutput {
    pub text: String,
    pub blocks: usize,
    pub watch_path: PathBuf,
}

/// Rewrite one tenant's fragment (or the rule's template) for `rule`.
pub fn rewrite_tenant(rule: &RewriteRule, tenant: &TenantDirectory) -> TenantOutput {
    let (source, watch_path) = match fs::read_to_string(&tenant.fragment_path) {
        Ok(text) => (Some(text), tenant.fragment_path.clone()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            let template = rule
                .default_template()
                .and_then(|path| fs::read_to_string(path).ok());
            (template, tenant.path.clone())
        }
        // Present but unreadable (or not UTF-8): the tenant's own file still
        // wins over the template, so it contributes nothing.
        Err(e) => {
            tracing::warn!(
                tenant = %tenant.name,
                path = %tenant.fragment_path.display(),
                error = %e,
                "Skipping tenant with unreadable fragment"
            );
            (None, tenant.fragment_path.clone())
        }
    };

    let Some(source) = source else {
        return TenantOutput {
            watch_path,
            ..Default::default()
        };
    };

    match rewrite_source(rule, &tenant.path, &source) {
        Ok((text, blocks)) => TenantOutput {
            text,
            blocks,
            watch_path,
        },
        Err(e) => {
            tracing::warn!(
                tenant = %tenant.name,
                path = %tenant.path.display(),
                error = %e,
                "Skipping tenant with unparseable fragment"
            );
            TenantOutput {
                watch_path,
                ..Default::default()
            }
        }
    }
}

/// Parse `source` and rewrite every block for the tenant at `tenant_path`.
///
/// Returns the concatenated text and the number of blocks.
pub fn rewrite_source(
    rule: &RewriteRule,
    tenant_path: &Path,
    source: &str,
) -> Result<(String, usize), ParseError> {
    let blocks = caddyfile::parse(source)?;
    let count = blocks.len();
    let text = blocks
        .into_iter()
        .map(|block| rewrite_block(rule, tenant_path, block))
        .collect();
    Ok((text, count))
}

fn rewrite_block(rule: &RewriteRule, tenant_path: &Path, mut block: ServerBlock) -> String {
    let keys: Vec<String> = block
        .keys
        .iter()
        .map(|key| rule.rewrite_key(key, tenant_path))
        .collect();

    inject_root(tenant_path, &mut block);
    caddyfile::serialize_block(&keys, &block.directives)
}

/// Point the block's `root` at the tenant directory, or at a subdirectory of
/// it when the fragment already names one.
fn inject_root(tenant_path: &Path, block: &mut ServerBlock) {
    let existing = block.directives.get(ROOT_DIRECTIVE);
    let line = existing.and_then(|tokens| tokens.first()).and_then(|t| t.line);
    let root = match existing.and_then(|tokens| tokens.get(1)) {
        Some(sub) => join_clean(tenant_path, &sub.text),
        None => tenant_path.to_path_buf(),
    };

    let token = |text: String| match line {
        Some(line) => Token::new(line, text),
        None => Token::synthetic(text),
    };
    let tokens = vec![
        token(ROOT_DIRECTIVE.to_string()),
        token(root.to_string_lossy().into_owned()),
    ];
    block.directives.insert(ROOT_DIRECTIVE.to_string(), tokens);
}

/// Join `rel` under `base` lexically. Leading slashes in `rel` do not escape
/// `base`; `.` is dropped and `..` pops.
fn join_clean(base: &Path, rel: &str) -> PathBuf {
    let mut out = base.to_path_buf();
    for component in Path::new(rel).components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::ParentDir => {
                out.pop();
            }
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> RewriteRule {
        RewriteRule::new("/srv/*", "example.com:@1.internal", None).unwrap()
    }

    #[test]
    fn test_root_from_subdirectory() {
        let (text, blocks) =
            rewrite_source(&rule(), Path::new("/srv/a/b"), "x.example.com {\n  root sub\n}\n")
                .unwrap();
        assert_eq!(blocks, 1);
        assert_eq!(text, "x.b.internal {\n    root /srv/a/b/sub\n}\n");
    }

    #[test]
    fn test_root_injected_when_missing() {
        let (text, _) = rewrite_source(
            &rule(),
            Path::new("/srv/a/b"),
            "x.example.com {\n  gzip\n}\n",
        )
        .unwrap();
        assert_eq!(text, "x.b.internal {\n    root /srv/a/b\n    gzip\n}\n");
    }

    #[test]
    fn test_root_keeps_source_line() {
        let (text, _) = rewrite_source(
            &rule(),
            Path::new("/srv/t"),
            "s {\n  gzip\n  root /public\n  log stdout\n}\n",
        )
        .unwrap();
        assert_eq!(
            text,
            "s {\n    gzip\n    root /srv/t/public\n    log stdout\n}\n"
        );
    }

    #[test]
    fn test_join_clean() {
        let base = Path::new("/srv/t");
        assert_eq!(join_clean(base, "./www/../public"), PathBuf::from("/srv/t/public"));
        assert_eq!(join_clean(base, "/abs"), PathBuf::from("/srv/t/abs"));
    }

    #[test]
    fn test_parse_error_is_returned() {
        assert!(rewrite_source(&rule(), Path::new("/srv/t"), "s {\n gzip\n").is_err());
    }

    #[test]
    fn test_each_block_rewritten() {
        let (text, blocks) = rewrite_source(
            &rule(),
            Path::new("/srv/acme"),
            "a.example.com {\n  gzip\n}\nb.example.com {\n  root www\n}\n",
        )
        .unwrap();
        assert_eq!(blocks, 2);
        assert_eq!(
            text,
            "a.acme.internal {\n    root /srv/acme\n    gzip\n}\nb.acme.internal {\n    root /srv/acme/www\n}\n"
        );
    }
}
