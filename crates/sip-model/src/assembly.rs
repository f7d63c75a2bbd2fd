use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use sip_types::{AssemblyId, DescriptionLevel};

use crate::metadata::MetadataEntry;
use crate::representation::Representation;

/// Whether packaging creates a new intellectual entity or updates an
/// existing one in the repository.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SipStatus {
    #[default]
    New,
    Update,
}

/// Format-agnostic, in-memory representation of one archival package.
///
/// Holds everything the packaging pipeline needs to serialize a package in
/// any supported format. Only path references are kept; content bytes are
/// streamed at packaging time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PackageAssembly {
    pub id: AssemblyId,
    pub title: String,
    pub level: DescriptionLevel,
    pub metadata: Vec<MetadataEntry>,
    pub representations: Vec<Representation>,
    /// Extra non-content files packaged under the documentation area.
    /// A reference may point at a directory, which is copied recursively.
    pub documentation: Vec<PathBuf>,
    /// Ancestor identifiers, nearest first, used for repository placement.
    pub ancestors: Vec<String>,
    pub status: SipStatus,
}

impl PackageAssembly {
    /// Create an empty assembly with a fresh id.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: AssemblyId::new(),
            title: title.into(),
            level: DescriptionLevel::default(),
            metadata: Vec::new(),
            representations: Vec::new(),
            documentation: Vec::new(),
            ancestors: Vec::new(),
            status: SipStatus::New,
        }
    }

    pub fn with_level(mut self, level: DescriptionLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_ancestors(mut self, ancestors: Vec<String>) -> Self {
        self.ancestors = ancestors;
        self
    }

    /// Mark this assembly as an update of an existing entity.
    pub fn mark_update(&mut self) {
        self.status = SipStatus::Update;
    }

    pub fn add_metadata(&mut self, entry: MetadataEntry) {
        self.metadata.push(entry);
    }

    pub fn add_representation(&mut self, representation: Representation) {
        self.representations.push(representation);
    }

    pub fn add_documentation(&mut self, path: impl Into<PathBuf>) {
        self.documentation.push(path.into());
    }

    /// Look up a representation by name.
    pub fn representation(&self, name: &str) -> Option<&Representation> {
        self.representations.iter().find(|r| r.name == name)
    }

    /// Total number of content file references across representations.
    pub fn file_count(&self) -> usize {
        self.representations.iter().map(Representation::file_count).sum()
    }

    /// All content file references in representation order.
    pub fn all_files(&self) -> Vec<PathBuf> {
        self.representations
            .iter()
            .flat_map(|r| r.files().cloned())
            .collect()
    }
}
