use std::path::PathBuf;

use serde::Serialize;
use sip_model::PackageAssembly;
use sip_types::RuleId;

/// A candidate file that could not be claimed because another rule already
/// owns it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SkippedPath {
    pub path: PathBuf,
    pub owner: RuleId,
}

/// Outcome of applying one rule.
#[derive(Clone, Debug, Serialize)]
pub struct RuleReport {
    pub rule_id: RuleId,
    /// Assemblies produced, in source order.
    pub assemblies: Vec<PackageAssembly>,
    /// Candidate files lost to other rules. Non-fatal.
    pub skipped: Vec<SkippedPath>,
    /// Candidate files rejected by the rule's own filter.
    pub filtered: u64,
    /// Number of paths this rule newly claimed.
    pub mapped_count: usize,
}

impl RuleReport {
    /// Returns `true` if the rule produced no assemblies at all.
    pub fn is_empty(&self) -> bool {
        self.assemblies.is_empty()
    }
}
