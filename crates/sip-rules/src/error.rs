use std::path::PathBuf;

use sip_tree::TreeError;
use sip_types::RuleId;
use thiserror::Error;

/// Errors from rule construction and application.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("rule {0} is not applied")]
    UnknownRule(RuleId),

    #[error("rule has no source paths")]
    EmptySources,

    #[error("source {} is not part of the scanned tree", .0.display())]
    UnknownSource(PathBuf),

    #[error("invalid rule filter: {0}")]
    Filter(String),

    #[error("unknown association strategy: {0}")]
    UnknownAssociation(String),

    #[error(transparent)]
    Tree(#[from] TreeError),
}

pub type RuleResult<T> = Result<T, RuleError>;
