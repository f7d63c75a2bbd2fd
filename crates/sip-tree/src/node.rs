use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What a tree node represents on disk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// A regular file with its size in bytes.
    File { size: u64 },
    /// A directory.
    Directory,
}

/// One filesystem entry in a [`FileTree`](crate::FileTree) arena.
///
/// Children are stored as a name-ordered set of absolute path keys into the
/// owning arena; the node itself carries no parent pointer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Absolute path of this entry; also its arena key.
    pub path: PathBuf,
    pub kind: NodeKind,
    /// Arena keys of direct children (empty for files).
    pub children: BTreeSet<PathBuf>,
}

impl TreeNode {
    /// Create a file node.
    pub fn new_file(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::File { size },
            children: BTreeSet::new(),
        }
    }

    /// Create an empty directory node.
    pub fn new_dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            kind: NodeKind::Directory,
            children: BTreeSet::new(),
        }
    }

    /// Create a node of the given kind.
    pub fn new(path: impl Into<PathBuf>, kind: NodeKind) -> Self {
        Self {
            path: path.into(),
            kind,
            children: BTreeSet::new(),
        }
    }

    /// Returns `true` if this node is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory)
    }

    /// Returns `true` if this node is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self.kind, NodeKind::File { .. })
    }

    /// File size in bytes, or `None` for directories.
    pub fn file_size(&self) -> Option<u64> {
        match self.kind {
            NodeKind::File { size } => Some(size),
            NodeKind::Directory => None,
        }
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The final path component, used as display name and package title.
    pub fn name(&self) -> String {
        name_of(&self.path)
    }
}

/// Final path component of `path` as a displayable string.
pub fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_node_properties() {
        let node = TreeNode::new_file("/data/a.txt", 42);
        assert!(node.is_file());
        assert!(!node.is_dir());
        assert_eq!(node.file_size(), Some(42));
        assert_eq!(node.name(), "a.txt");
        assert_eq!(node.child_count(), 0);
    }

    #[test]
    fn dir_node_properties() {
        let node = TreeNode::new_dir("/data");
        assert!(node.is_dir());
        assert_eq!(node.file_size(), None);
        assert_eq!(node.name(), "data");
    }
}
