//! The rule engine: maps tree selections into package assemblies.
//!
//! A [`Rule`] names source paths, an [`Association`] strategy, and an
//! optional [`RuleFilter`]. The [`RuleEngine`] applies rules against a
//! scanned [`FileTree`](sip_tree::FileTree), claiming each included file in
//! the shared [`PathRegistry`](sip_tree::PathRegistry) so no file is ever
//! packaged twice, and can reverse any applied rule by restoring the exact
//! pre-rule disposition of every claimed path.

pub mod engine;
pub mod error;
pub mod filter;
pub mod report;
pub mod rule;
pub mod strategy;

pub use engine::RuleEngine;
pub use error::{RuleError, RuleResult};
pub use filter::RuleFilter;
pub use report::{RuleReport, SkippedPath};
pub use rule::Rule;
pub use strategy::Association;
