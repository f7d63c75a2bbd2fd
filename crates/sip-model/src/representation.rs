use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// A named grouping of files inside a package, modeling one content variant
/// (e.g. master vs. derivative).
///
/// Files are held as path references only. When `base` is set, the files'
/// directory structure relative to it is preserved inside the package;
/// otherwise files are laid out flat under the representation root.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Representation {
    pub name: String,
    /// Content type label carried into package metadata.
    pub content_type: String,
    /// Base directory the file structure is preserved relative to.
    pub base: Option<PathBuf>,
    files: BTreeSet<PathBuf>,
}

impl Representation {
    /// Create an empty representation with the default content type.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content_type: "MIXED".to_string(),
            base: None,
            files: BTreeSet::new(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Preserve structure relative to `base` when packaging.
    pub fn with_base(mut self, base: impl Into<PathBuf>) -> Self {
        self.base = Some(base.into());
        self
    }

    /// Add a file reference. Returns `true` if it was not already present.
    pub fn add_file(&mut self, path: impl Into<PathBuf>) -> bool {
        self.files.insert(path.into())
    }

    /// Remove a file reference. Returns `true` if it was present.
    pub fn remove_file(&mut self, path: &Path) -> bool {
        self.files.remove(path)
    }

    /// Returns `true` if `path` is referenced by this representation.
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    /// The referenced files in name order.
    pub fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.files.iter()
    }

    /// Number of referenced files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Returns `true` if no files are referenced.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// The in-package relative path for `file`: relative to `base` when set
    /// and applicable, the bare file name otherwise.
    pub fn relative_path(&self, file: &Path) -> PathBuf {
        if let Some(base) = &self.base {
            if let Ok(rel) = file.strip_prefix(base) {
                return rel.to_path_buf();
            }
        }
        file.file_name().map(PathBuf::from).unwrap_or_default()
    }
}
