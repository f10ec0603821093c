//! Aggregation of all rules into one configuration text.

use crate::config::RuleConfig;
use crate::synthesis::rewriter::rewrite_tenant;
use crate::synthesis::rule::{RewriteRule, RuleError};
use crate::synthesis::scanner::scan;
use crate::watch::WatchSet;

/// Output of one synthesis pass.
#[derive(Debug, Default)]
pub struct Synthesis {
    /// The aggregate configuration text.
    pub text: String,
    /// Everything the watcher must observe until the next pass.
    pub watch_paths: WatchSet,
    /// Number of tenants discovered across all rules.
    pub tenants: usize,
}

/// Ordered list of rewrite rules. The first rule's tenants come first.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from configuration, failing on the first malformed rule.
    pub fn from_configs(configs: &[RuleConfig]) -> Result<Self, RuleError> {
        let rules = configs
            .iter()
            .map(RewriteRule::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn push(&mut self, rule: RewriteRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The aggregate text alone, for dry runs.
    pub fn render_once(&self) -> String {
        self.synthesize().text
    }

    /// Run one full pass over every rule and tenant.
    pub fn synthesize(&self) -> Synthesis {
        let mut out = Synthesis::default();

        for rule in &self.rules {
            let found = scan(rule.source_glob());
            tracing::debug!(
                glob = %rule.source_glob(),
                roots = found.roots.len(),
                tenants = found.tenants.len(),
                "Scanned rule"
            );

            for tenant in &found.tenants {
                let output = rewrite_tenant(rule, tenant);
                out.text.push_str(&output.text);
                out.watch_paths.insert(output.watch_path);
                out.watch_paths.insert(tenant.path.clone());
            }
            out.tenants += found.tenants.len();

            // Roots are watched even when empty, to see the first tenant arrive.
            for root in found.roots {
                out.watch_paths.insert(root);
            }
        }

        out
    }
}
