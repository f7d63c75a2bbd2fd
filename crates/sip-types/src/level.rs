use std::fmt;

use serde::{Deserialize, Serialize};

/// Archival description level of a package assembly.
///
/// Mirrors the standard descriptive hierarchy used by repository ingest
/// profiles. The level only affects descriptive metadata; it never changes
/// how content is grouped.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DescriptionLevel {
    Fonds,
    Series,
    File,
    Item,
    /// Repository-specific level identified by name.
    Other(String),
}

impl DescriptionLevel {
    /// The identifier used in descriptive metadata.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Fonds => "fonds",
            Self::Series => "series",
            Self::File => "file",
            Self::Item => "item",
            Self::Other(name) => name,
        }
    }
}

impl Default for DescriptionLevel {
    fn default() -> Self {
        Self::File
    }
}

impl fmt::Display for DescriptionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_level_is_file() {
        assert_eq!(DescriptionLevel::default(), DescriptionLevel::File);
    }

    #[test]
    fn custom_level_name() {
        let level = DescriptionLevel::Other("collection".into());
        assert_eq!(level.as_str(), "collection");
        assert_eq!(level.to_string(), "collection");
    }
}
