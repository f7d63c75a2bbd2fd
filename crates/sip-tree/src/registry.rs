//! The path disposition registry.
//!
//! One registry exists per mapping session. It is the single source of
//! truth preventing a file from being claimed by two rules simultaneously:
//! every mapping transition goes through [`PathRegistry::try_map`], which is
//! linearizable behind a coarse `RwLock`. Data is lost when the session is
//! dropped; nothing here persists across sessions.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sip_types::{PathState, RuleId};

use crate::error::{TreeError, TreeResult};

/// Disposition record for one path.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryEntry {
    pub state: PathState,
    /// The rule that claimed this path, when `state` is `Mapped`.
    pub owner: Option<RuleId>,
}

/// Counts of known entries per state, for status display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RegistryCounts {
    pub ignored: usize,
    pub mapped: usize,
}

/// Process-wide map from path to disposition state.
///
/// Unseen paths default to [`PathState::Normal`] and carry no entry at all;
/// the map only holds paths that are ignored or mapped. All per-path
/// mutations are linearizable.
#[derive(Debug, Default)]
pub struct PathRegistry {
    entries: RwLock<HashMap<PathBuf, RegistryEntry>>,
}

impl PathRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The disposition of `path`; `Normal` for unseen paths.
    pub fn state(&self, path: &Path) -> PathState {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .get(path)
            .map(|e| e.state)
            .unwrap_or(PathState::Normal)
    }

    /// The rule owning `path`, if it is mapped.
    pub fn owner(&self, path: &Path) -> Option<RuleId> {
        self.entries
            .read()
            .expect("registry lock poisoned")
            .get(path)
            .and_then(|e| e.owner)
    }

    /// Record `path` as hidden by an ignore pattern.
    pub fn set_ignored(&self, path: &Path) {
        self.entries
            .write()
            .expect("registry lock poisoned")
            .insert(
                path.to_path_buf(),
                RegistryEntry {
                    state: PathState::Ignored,
                    owner: None,
                },
            );
    }

    /// Atomically claim `path` for `rule`, returning the pre-transition
    /// state for the rule's reversal record.
    ///
    /// Fails if the path is already mapped (by any rule): a path becomes
    /// mapped exactly once.
    pub fn try_map(&self, path: &Path, rule: RuleId) -> TreeResult<PathState> {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        match entries.get(path) {
            Some(entry) if entry.state.is_mapped() => Err(TreeError::AlreadyMapped {
                path: path.to_path_buf(),
                owner: entry.owner.unwrap_or(rule),
            }),
            prior => {
                let prior_state = prior.map(|e| e.state).unwrap_or(PathState::Normal);
                entries.insert(
                    path.to_path_buf(),
                    RegistryEntry {
                        state: PathState::Mapped,
                        owner: Some(rule),
                    },
                );
                Ok(prior_state)
            }
        }
    }

    /// Restore `path` to a recorded prior state, releasing any ownership.
    ///
    /// Restoring to `Normal` removes the entry entirely (the default state
    /// carries no record).
    pub fn restore(&self, path: &Path, prior: PathState) {
        let mut entries = self.entries.write().expect("registry lock poisoned");
        match prior {
            PathState::Normal => {
                entries.remove(path);
            }
            state => {
                entries.insert(
                    path.to_path_buf(),
                    RegistryEntry { state, owner: None },
                );
            }
        }
    }

    /// Forget everything recorded about `path` (back to `Normal`).
    pub fn clear(&self, path: &Path) {
        self.entries
            .write()
            .expect("registry lock poisoned")
            .remove(path);
    }

    /// Counts of known entries per state.
    pub fn snapshot_counts(&self) -> RegistryCounts {
        let entries = self.entries.read().expect("registry lock poisoned");
        let mut counts = RegistryCounts::default();
        for entry in entries.values() {
            match entry.state {
                PathState::Ignored => counts.ignored += 1,
                PathState::Mapped => counts.mapped += 1,
                PathState::Normal => {}
            }
        }
        counts
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.read().expect("registry lock poisoned").len()
    }

    /// Returns `true` if nothing is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.read().expect("registry lock poisoned").is_empty()
    }

    /// Tear down all recorded state; used when a session is closed or reset.
    pub fn reset(&self) {
        self.entries.write().expect("registry lock poisoned").clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> PathBuf {
        PathBuf::from(s)
    }

    #[test]
    fn unseen_path_defaults_to_normal() {
        let registry = PathRegistry::new();
        assert_eq!(registry.state(&p("/never/seen")), PathState::Normal);
        assert!(registry.is_empty());
    }

    #[test]
    fn try_map_from_normal_records_prior_state() {
        let registry = PathRegistry::new();
        let rule = RuleId::new();
        let prior = registry.try_map(&p("/a"), rule).unwrap();
        assert_eq!(prior, PathState::Normal);
        assert_eq!(registry.state(&p("/a")), PathState::Mapped);
        assert_eq!(registry.owner(&p("/a")), Some(rule));
    }

    #[test]
    fn try_map_from_ignored_records_prior_state() {
        let registry = PathRegistry::new();
        registry.set_ignored(&p("/a"));
        let prior = registry.try_map(&p("/a"), RuleId::new()).unwrap();
        assert_eq!(prior, PathState::Ignored);
        assert_eq!(registry.state(&p("/a")), PathState::Mapped);
    }

    #[test]
    fn second_rule_cannot_claim_mapped_path() {
        let registry = PathRegistry::new();
        let first = RuleId::new();
        registry.try_map(&p("/a"), first).unwrap();

        let err = registry.try_map(&p("/a"), RuleId::new()).unwrap_err();
        match err {
            TreeError::AlreadyMapped { owner, .. } => assert_eq!(owner, first),
            other => panic!("unexpected error: {other}"),
        }
        // Ownership unchanged.
        assert_eq!(registry.owner(&p("/a")), Some(first));
    }

    #[test]
    fn restore_returns_exact_prior_state() {
        let registry = PathRegistry::new();
        let rule = RuleId::new();

        registry.set_ignored(&p("/was-ignored"));
        let prior_ignored = registry.try_map(&p("/was-ignored"), rule).unwrap();
        let prior_normal = registry.try_map(&p("/was-normal"), rule).unwrap();

        registry.restore(&p("/was-ignored"), prior_ignored);
        registry.restore(&p("/was-normal"), prior_normal);

        assert_eq!(registry.state(&p("/was-ignored")), PathState::Ignored);
        assert_eq!(registry.state(&p("/was-normal")), PathState::Normal);
        assert_eq!(registry.owner(&p("/was-ignored")), None);
    }

    #[test]
    fn snapshot_counts_by_state() {
        let registry = PathRegistry::new();
        registry.set_ignored(&p("/i1"));
        registry.set_ignored(&p("/i2"));
        registry.try_map(&p("/m1"), RuleId::new()).unwrap();

        let counts = registry.snapshot_counts();
        assert_eq!(counts.ignored, 2);
        assert_eq!(counts.mapped, 1);
    }

    #[test]
    fn reset_clears_everything() {
        let registry = PathRegistry::new();
        registry.set_ignored(&p("/i"));
        registry.try_map(&p("/m"), RuleId::new()).unwrap();
        registry.reset();
        assert!(registry.is_empty());
        assert_eq!(registry.state(&p("/m")), PathState::Normal);
    }

    // -----------------------------------------------------------------
    // Concurrency
    // -----------------------------------------------------------------

    #[test]
    fn concurrent_claims_map_each_path_once() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(PathRegistry::new());
        let path = p("/contested");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let path = path.clone();
                thread::spawn(move || registry.try_map(&path, RuleId::new()).is_ok())
            })
            .collect();

        let wins: usize = handles
            .into_iter()
            .map(|h| h.join().expect("thread should not panic"))
            .filter(|won| *won)
            .count();

        assert_eq!(wins, 1);
        assert_eq!(registry.state(&path), PathState::Mapped);
    }

    // -----------------------------------------------------------------
    // Map / restore round-trip property
    // -----------------------------------------------------------------

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn prior_state() -> impl Strategy<Value = PathState> {
            prop_oneof![Just(PathState::Normal), Just(PathState::Ignored)]
        }

        proptest! {
            #[test]
            fn map_then_restore_is_identity(states in proptest::collection::vec(prior_state(), 1..32)) {
                let registry = PathRegistry::new();
                let rule = RuleId::new();
                let paths: Vec<PathBuf> =
                    (0..states.len()).map(|i| PathBuf::from(format!("/p/{i}"))).collect();

                for (path, state) in paths.iter().zip(&states) {
                    if *state == PathState::Ignored {
                        registry.set_ignored(path);
                    }
                }

                let mut transitions = Vec::new();
                for path in &paths {
                    let prior = registry.try_map(path, rule).unwrap();
                    transitions.push((path.clone(), prior));
                }

                for (path, prior) in &transitions {
                    registry.restore(path, *prior);
                }

                for (path, state) in paths.iter().zip(&states) {
                    prop_assert_eq!(registry.state(path), *state);
                    prop_assert_eq!(registry.owner(path), None);
                }
            }
        }
    }
}
