//! Ignore pattern matching.
//!
//! Patterns use gitignore-style glob syntax. A matched entry is invisible
//! to the rest of the system: the walker records it as ignored and never
//! constructs descendant nodes.

use std::path::Path;

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use sip_types::ConfigProvider;

use crate::error::{WalkError, WalkResult};

/// Configuration key holding comma-separated default ignore patterns.
pub const IGNORE_PATTERNS_KEY: &str = "walk.ignore";

/// Split a comma-separated pattern list, trimming whitespace and dropping
/// empty entries.
pub fn split_patterns(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Predicate set deciding which filesystem entries are invisible.
#[derive(Debug)]
pub struct IgnoreFilter {
    matcher: Gitignore,
}

impl IgnoreFilter {
    /// Build a filter from gitignore-style glob patterns.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> WalkResult<Self> {
        let mut builder = GitignoreBuilder::new("/");
        for pattern in patterns {
            builder
                .add_line(None, pattern.as_ref())
                .map_err(|e| WalkError::Pattern(e.to_string()))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| WalkError::Pattern(e.to_string()))?;
        Ok(Self { matcher })
    }

    /// A filter that matches nothing.
    pub fn empty() -> Self {
        Self {
            matcher: Gitignore::empty(),
        }
    }

    /// Build a filter from the `walk.ignore` configuration key
    /// (comma-separated patterns), falling back to an empty filter when the
    /// key is absent.
    pub fn from_config(config: &dyn ConfigProvider) -> WalkResult<Self> {
        match config.get(IGNORE_PATTERNS_KEY) {
            Some(raw) => Self::new(&split_patterns(&raw)),
            None => Ok(Self::empty()),
        }
    }

    /// Returns `true` if `path` (or any of its parents) matches an ignore
    /// pattern.
    pub fn matches(&self, path: &Path, is_dir: bool) -> bool {
        self.matcher
            .matched_path_or_any_parents(path, is_dir)
            .is_ignore()
    }
}
