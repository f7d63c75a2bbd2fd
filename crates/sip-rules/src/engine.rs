//! Rule application and reversal.

use std::path::PathBuf;
use std::sync::Arc;

use sip_model::{MetadataEntry, PackageAssembly, Representation};
use sip_tree::{FileTree, PathRegistry, TreeError};
use sip_types::{ConfigProvider, PathState, RuleId};
use tracing::{debug, warn};

use crate::error::{RuleError, RuleResult};
use crate::report::{RuleReport, SkippedPath};
use crate::rule::Rule;
use crate::strategy::candidate_groups;

/// Name given to the content representation each rule produces.
const CONTENT_REPRESENTATION: &str = "rep1";

struct AppliedRule {
    rule: Rule,
    /// Per-path pre-claim states, recorded so removal restores the registry
    /// to exactly what it was before this rule ran.
    transitions: Vec<(PathBuf, PathState)>,
    report: RuleReport,
}

/// Applies rules against a scanned tree, claiming paths in the shared
/// registry, and reverses them on demand.
///
/// Conflicts are per-path and non-fatal: a candidate already owned by
/// another rule is reported as skipped while the rest of the rule proceeds.
pub struct RuleEngine {
    registry: Arc<PathRegistry>,
    config: Arc<dyn ConfigProvider>,
    applied: Vec<AppliedRule>,
}

impl RuleEngine {
    pub fn new(registry: Arc<PathRegistry>, config: Arc<dyn ConfigProvider>) -> Self {
        Self {
            registry,
            config,
            applied: Vec::new(),
        }
    }

    /// The shared disposition registry.
    pub fn registry(&self) -> &Arc<PathRegistry> {
        &self.registry
    }

    /// Ids of currently applied rules, in application order.
    pub fn applied_rules(&self) -> Vec<RuleId> {
        self.applied.iter().map(|a| a.rule.id).collect()
    }

    /// Number of currently applied rules.
    pub fn rule_count(&self) -> usize {
        self.applied.len()
    }

    /// Apply `rule` against `tree`, producing assemblies and claiming every
    /// included file in the registry.
    ///
    /// Candidates already owned by another rule are skipped, not fatal; an
    /// assembly whose files were all skipped is dropped. The rule is
    /// recorded as applied even when it produced nothing, so it can still
    /// be removed.
    pub fn apply(&mut self, rule: Rule, tree: &FileTree) -> RuleResult<RuleReport> {
        if rule.sources.is_empty() {
            return Err(RuleError::EmptySources);
        }
        let (groups, filtered) =
            candidate_groups(rule.association, tree, &rule.sources, &rule.filter)?;

        let mut transitions: Vec<(PathBuf, PathState)> = Vec::new();
        let mut skipped: Vec<SkippedPath> = Vec::new();
        let mut assemblies: Vec<PackageAssembly> = Vec::new();

        for group in groups {
            let mut claimed: Vec<PathBuf> = Vec::new();
            for file in group.files {
                match self.registry.try_map(&file, rule.id) {
                    Ok(prior) => {
                        transitions.push((file.clone(), prior));
                        claimed.push(file);
                    }
                    Err(TreeError::AlreadyMapped { path, owner }) => {
                        debug!(path = %path.display(), %owner, "candidate already mapped, skipping");
                        skipped.push(SkippedPath { path, owner });
                    }
                    Err(other) => return Err(other.into()),
                }
            }
            if claimed.is_empty() {
                continue;
            }

            let mut representation = Representation::new(CONTENT_REPRESENTATION);
            if let Some(base) = group.base {
                representation = representation.with_base(base);
            }
            for file in claimed {
                representation.add_file(file);
            }

            let mut assembly = PackageAssembly::new(group.title).with_level(group.level);
            assembly.add_representation(representation);
            if let Some(key) = &rule.metadata_template {
                match self.config.get(key) {
                    Some(content) => {
                        assembly.add_metadata(MetadataEntry::new(key.clone(), "descriptive", content));
                    }
                    None => warn!(key = %key, "metadata template key not configured"),
                }
            }
            assemblies.push(assembly);
        }

        debug!(
            rule = %rule.id,
            assemblies = assemblies.len(),
            mapped = transitions.len(),
            skipped = skipped.len(),
            "rule applied"
        );

        let report = RuleReport {
            rule_id: rule.id,
            skipped,
            filtered,
            mapped_count: transitions.len(),
            assemblies,
        };
        self.applied.push(AppliedRule {
            rule,
            transitions,
            report: report.clone(),
        });
        Ok(report)
    }

    /// The report produced when `rule_id` was applied, if it still is.
    pub fn report_for(&self, rule_id: RuleId) -> Option<&RuleReport> {
        self.applied
            .iter()
            .find(|a| a.rule.id == rule_id)
            .map(|a| &a.report)
    }

    /// Remove an applied rule, restoring every path it claimed to its exact
    /// pre-rule state (including previously ignored paths).
    ///
    /// Returns the number of paths released.
    pub fn remove(&mut self, rule_id: RuleId) -> RuleResult<usize> {
        let index = self
            .applied
            .iter()
            .position(|a| a.rule.id == rule_id)
            .ok_or(RuleError::UnknownRule(rule_id))?;
        let applied = self.applied.remove(index);
        for (path, prior) in &applied.transitions {
            self.registry.restore(path, *prior);
        }
        debug!(
            rule = %rule_id,
            released = applied.transitions.len(),
            assemblies = applied.report.assemblies.len(),
            "rule removed"
        );
        Ok(applied.transitions.len())
    }

    /// Remove every applied rule and wipe all registry state. Session
    /// teardown.
    pub fn reset(&mut self) {
        self.applied.clear();
        self.registry.reset();
    }
}
