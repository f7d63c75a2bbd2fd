use std::path::PathBuf;

use sip_types::RuleId;

use crate::filter::RuleFilter;
use crate::strategy::Association;

/// A mapping rule: which tree paths to select and how to group them into
/// package assemblies.
///
/// Rules are inert descriptions; applying one is the
/// [`RuleEngine`](crate::RuleEngine)'s job.
#[derive(Debug)]
pub struct Rule {
    pub id: RuleId,
    pub association: Association,
    /// Tree paths this rule selects (directories or files).
    pub sources: Vec<PathBuf>,
    pub filter: RuleFilter,
    /// Configuration key of a metadata template to attach to each produced
    /// assembly.
    pub metadata_template: Option<String>,
}

impl Rule {
    /// Create a rule over `sources` with a fresh id and no filter.
    pub fn new(association: Association, sources: Vec<PathBuf>) -> Self {
        Self {
            id: RuleId::new(),
            association,
            sources,
            filter: RuleFilter::accept_all(),
            metadata_template: None,
        }
    }

    pub fn with_filter(mut self, filter: RuleFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_metadata_template(mut self, key: impl Into<String>) -> Self {
        self.metadata_template = Some(key.into());
        self
    }
}
