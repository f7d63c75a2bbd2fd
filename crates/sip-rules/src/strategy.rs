//! Association strategies: how a rule's tree selection maps into packages.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use sip_tree::{name_of, FileTree};
use sip_types::DescriptionLevel;

use crate::error::{RuleError, RuleResult};
use crate::filter::RuleFilter;

/// How selected tree paths group into package assemblies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Association {
    /// All selected files land in one assembly, laid out flat.
    #[default]
    Single,
    /// One assembly per selected file.
    PerFile,
    /// One assembly per selected top-level entry, preserving the directory
    /// structure beneath it.
    PerTopLevelStructure,
    /// One assembly per selected top-level entry, with descendant files
    /// laid out flat.
    PerSelection,
}

impl Association {
    pub const ALL: [Association; 4] = [
        Association::Single,
        Association::PerFile,
        Association::PerTopLevelStructure,
        Association::PerSelection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Association::Single => "single",
            Association::PerFile => "per-file",
            Association::PerTopLevelStructure => "per-top-level",
            Association::PerSelection => "per-selection",
        }
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Association {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Association::Single),
            "per-file" => Ok(Association::PerFile),
            "per-top-level" => Ok(Association::PerTopLevelStructure),
            "per-selection" => Ok(Association::PerSelection),
            other => Err(RuleError::UnknownAssociation(other.to_string())),
        }
    }
}

/// One would-be assembly produced by a strategy, before any disposition
/// claims are attempted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct CandidateGroup {
    pub title: String,
    pub level: DescriptionLevel,
    /// When set, file structure relative to this directory is preserved
    /// inside the assembly's representation.
    pub base: Option<PathBuf>,
    pub files: Vec<PathBuf>,
}

/// Expand `sources` into candidate groups per the strategy, applying the
/// rule filter. Returns the groups plus the count of filtered-out files.
///
/// Groups with no surviving files are dropped here; a source that is itself
/// absent from the tree is an error.
pub(crate) fn candidate_groups(
    association: Association,
    tree: &FileTree,
    sources: &[PathBuf],
    filter: &RuleFilter,
) -> RuleResult<(Vec<CandidateGroup>, u64)> {
    let mut filtered = 0u64;
    let mut keep = |files: Vec<PathBuf>| -> Vec<PathBuf> {
        files
            .into_iter()
            .filter(|f| {
                let ok = filter.accepts(f);
                if !ok {
                    filtered += 1;
                }
                ok
            })
            .collect()
    };

    let groups = match association {
        Association::Single => {
            let mut all: BTreeSet<PathBuf> = BTreeSet::new();
            for source in sources {
                all.extend(files_of(tree, source)?);
            }
            let files = keep(all.into_iter().collect());
            if files.is_empty() {
                Vec::new()
            } else {
                vec![CandidateGroup {
                    title: name_of(&sources[0]),
                    level: DescriptionLevel::File,
                    base: None,
                    files,
                }]
            }
        }
        Association::PerFile => {
            let mut all: BTreeSet<PathBuf> = BTreeSet::new();
            for source in sources {
                all.extend(files_of(tree, source)?);
            }
            keep(all.into_iter().collect())
                .into_iter()
                .map(|file| CandidateGroup {
                    title: name_of(&file),
                    level: DescriptionLevel::Item,
                    base: None,
                    files: vec![file],
                })
                .collect()
        }
        Association::PerTopLevelStructure | Association::PerSelection => {
            let preserve = association == Association::PerTopLevelStructure;
            let mut groups = Vec::new();
            for source in sources {
                let node = tree
                    .get(source)
                    .ok_or_else(|| RuleError::UnknownSource(source.clone()))?;
                let files = keep(files_of(tree, source)?);
                if files.is_empty() {
                    continue;
                }
                groups.push(CandidateGroup {
                    title: name_of(source),
                    level: if node.is_file() {
                        DescriptionLevel::Item
                    } else {
                        DescriptionLevel::File
                    },
                    base: if preserve && node.is_dir() {
                        Some(source.clone())
                    } else {
                        None
                    },
                    files,
                });
            }
            groups
        }
    };
    Ok((groups, filtered))
}

fn files_of(tree: &FileTree, source: &Path) -> RuleResult<Vec<PathBuf>> {
    tree.files_under(source)
        .map_err(|_| RuleError::UnknownSource(source.to_path_buf()))
}
