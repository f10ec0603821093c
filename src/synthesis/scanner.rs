//! Tenant discovery.
//!
//! # Responsibilities
//! - Expand a rule's source glob into root directories
//! - List each root's immediate child directories as tenants
//! - Filter out entries whose names are not valid tenant names
//!
//! # Design Decisions
//! - Nothing is cached; tenants come and go between passes
//! - Unreadable or non-conforming entries are skipped, not reported
//! - Listings are sorted by name so a fixed tree yields fixed output

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::caddyfile::FRAGMENT_FILE_NAME;

static TENANT_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][a-z0-9.-]*$").expect("tenant name regex"));

/// Returns true if `name` is an acceptable tenant directory name.
pub fn is_valid_tenant_name(name: &str) -> bool {
    TENANT_NAME.is_match(name)
}

/// One discovered tenant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantDirectory {
    /// Absolute path of the tenant directory.
    pub path: PathBuf,
    /// Directory name.
    pub name: String,
    /// Where the tenant's own fragment would live (may not exist).
    pub fragment_path: PathBuf,
}

impl TenantDirectory {
    fn new(path: PathBuf, name: String) -> Self {
        let fragment_path = path.join(FRAGMENT_FILE_NAME);
        Self {
            path,
            name,
            fragment_path,
        }
    }
}

/// Result of scanning one rule's source glob.
#[derive(Debug, Default)]
pub struct Scan {
    /// Every directory the glob resolved to, tenants or not.
    pub roots: Vec<PathBuf>,
    pub tenants: Vec<TenantDirectory>,
}

/// Resolve `source_glob` to absolute directories. Non-directories are dropped.
pub fn resolve_roots(source_glob: &str) -> Vec<PathBuf> {
    let absolute = match std::path::absolute(source_glob) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(glob = %source_glob, error = %e, "Cannot resolve source glob");
            return Vec::new();
        }
    };

    let pattern = absolute.to_string_lossy();
    let paths = match glob::glob(&pattern) {
        Ok(paths) => paths,
        Err(e) => {
            tracing::warn!(glob = %pattern, error = %e, "Invalid source glob");
            return Vec::new();
        }
    };

    paths
        .filter_map(Result::ok)
        .filter(|p| p.is_dir())
        .collect()
}

/// List the tenants directly under `root`.
pub fn list_tenants(root: &Path) -> Vec<TenantDirectory> {
    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(root = %root.display(), error = %e, "Cannot list root");
            return Vec::new();
        }
    };

    let mut tenants: Vec<TenantDirectory> = entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            if !is_valid_tenant_name(&name) {
                return None;
            }
            // Follows symlinks, so a linked tenant directory counts.
            let path = entry.path();
            path.is_dir().then(|| TenantDirectory::new(path, name))
        })
        .collect();

    tenants.sort_by(|a, b| a.name.cmp(&b.name));
    tenants
}

/// Resolve roots and list every tenant under them.
pub fn scan(source_glob: &str) -> Scan {
    let roots = resolve_roots(source_glob);
    let tenants = roots.iter().flat_map(|root| list_tenants(root)).collect();
    Scan { roots, tenants }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_names() {
        for name in ["acme", "a", "0day", "foo.bar", "my-site", "a1.b-2"] {
            assert!(is_valid_tenant_name(name), "{name} should be valid");
        }
        for name in ["", ".hidden", "-dash", "Upper", "under_score", "sp ace", "ünï"] {
            assert!(!is_valid_tenant_name(name), "{name} should be invalid");
        }
    }

    #[test]
    fn test_list_tenants_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["beta", "alpha", ".git", "Caps", "_tmp"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let tenants = list_tenants(dir.path());
        let names: Vec<_> = tenants.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["alpha", "beta"]);
        assert_eq!(
            tenants[0].fragment_path,
            dir.path().join("alpha").join(FRAGMENT_FILE_NAME)
        );
    }

    #[test]
    fn test_resolve_roots_drops_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("one")).unwrap();
        fs::create_dir(dir.path().join("two")).unwrap();
        fs::write(dir.path().join("three"), "").unwrap();

        let pattern = dir.path().join("*");
        let roots = resolve_roots(&pattern.to_string_lossy());
        assert_eq!(roots, [dir.path().join("one"), dir.path().join("two")]);
    }

    #[test]
    fn test_missing_root() {
        let scan = scan("/definitely/not/here/*");
        assert!(scan.roots.is_empty());
        assert!(scan.tenants.is_empty());
    }
}
