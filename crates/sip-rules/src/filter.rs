//! Per-rule candidate filters.

use std::path::Path;

use sip_walk::IgnoreFilter;

use crate::error::{RuleError, RuleResult};

/// Include/exclude predicate applied to every candidate file of a rule.
///
/// A file is accepted when it matches the include patterns (all files, if
/// none are given) and does not match the exclude patterns. Rejected files
/// are silently left out of the rule's assemblies; their disposition state
/// never changes.
#[derive(Debug, Default)]
pub struct RuleFilter {
    include: Option<IgnoreFilter>,
    exclude: Option<IgnoreFilter>,
}

impl RuleFilter {
    /// Build from gitignore-style glob pattern lists. Empty lists mean
    /// "no constraint".
    pub fn new<S: AsRef<str>>(include: &[S], exclude: &[S]) -> RuleResult<Self> {
        let build = |patterns: &[S]| -> RuleResult<Option<IgnoreFilter>> {
            if patterns.is_empty() {
                Ok(None)
            } else {
                IgnoreFilter::new(patterns)
                    .map(Some)
                    .map_err(|e| RuleError::Filter(e.to_string()))
            }
        };
        Ok(Self {
            include: build(include)?,
            exclude: build(exclude)?,
        })
    }

    /// A filter accepting every file.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Returns `true` if `path` passes both constraints.
    pub fn accepts(&self, path: &Path) -> bool {
        if let Some(include) = &self.include {
            if !include.matches(path, false) {
                return false;
            }
        }
        if let Some(exclude) = &self.exclude {
            if exclude.matches(path, false) {
                return false;
            }
        }
        true
    }
}
