use std::fmt;

use serde::{Deserialize, Serialize};

/// Disposition of a filesystem path within a mapping session.
///
/// Every path is in exactly one state at any time. Paths that have never
/// been seen default to [`Normal`](Self::Normal).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathState {
    /// Visible and available for mapping.
    #[default]
    Normal,
    /// Hidden from the rest of the system by an ignore pattern.
    Ignored,
    /// Claimed by exactly one rule; cannot be claimed again.
    Mapped,
}

impl PathState {
    /// Returns `true` if the path is claimed by a rule.
    pub fn is_mapped(&self) -> bool {
        matches!(self, Self::Mapped)
    }

    /// Returns `true` if the path is hidden by an ignore pattern.
    pub fn is_ignored(&self) -> bool {
        matches!(self, Self::Ignored)
    }
}

impl fmt::Display for PathState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Ignored => write!(f, "ignored"),
            Self::Mapped => write!(f, "mapped"),
        }
    }
}
