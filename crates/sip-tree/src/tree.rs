//! The filesystem tree arena.
//!
//! [`FileTree`] manages a `BTreeMap<PathBuf, TreeNode>` mirroring the scanned
//! subtrees. Nodes are addressed by absolute path; directories reference
//! their children by path key. Removal is the only detach operation;
//! `flatten` is irreversible by design.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::{TreeError, TreeResult};
use crate::node::{NodeKind, TreeNode};

/// Arena of filesystem nodes addressed by absolute path.
///
/// Invariants:
/// - every path in a directory's `children` set has an arena entry;
/// - a node is reachable from exactly one parent (or is a root);
/// - removal detaches the subtree from its parent and drops every
///   descendant entry.
#[derive(Clone, Debug, Default)]
pub struct FileTree {
    nodes: BTreeMap<PathBuf, TreeNode>,
    roots: BTreeSet<PathBuf>,
}

impl FileTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes in the arena.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns `true` if `path` has an arena entry.
    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(path)
    }

    /// Look up a node by path.
    pub fn get(&self, path: &Path) -> Option<&TreeNode> {
        self.nodes.get(path)
    }

    /// The registered root paths, in name order.
    pub fn roots(&self) -> impl Iterator<Item = &PathBuf> {
        self.roots.iter()
    }

    /// Number of file nodes in the arena.
    pub fn file_count(&self) -> usize {
        self.nodes.values().filter(|n| n.is_file()).count()
    }

    // ---------------------------------------------------------------
    // Insertion
    // ---------------------------------------------------------------

    /// Insert a node, lazily creating intermediate directories.
    ///
    /// If no ancestor of `path` is present in the arena, the node becomes a
    /// new root. Otherwise the node is linked under its nearest present
    /// ancestor, with directory nodes created for any gap in between.
    /// Inserting an already-present path is a no-op (the original kind is
    /// kept).
    pub fn insert(&mut self, path: impl Into<PathBuf>, kind: NodeKind) -> TreeResult<()> {
        let path = path.into();
        if self.nodes.contains_key(&path) {
            return Ok(());
        }

        // Walk up until we hit a present ancestor, collecting the gap.
        let mut gap: Vec<PathBuf> = Vec::new();
        let mut cursor = path.clone();
        let anchor = loop {
            match cursor.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    if self.nodes.contains_key(parent) {
                        break Some(parent.to_path_buf());
                    }
                    gap.push(parent.to_path_buf());
                    cursor = parent.to_path_buf();
                }
                _ => break None,
            }
        };

        match anchor {
            None => {
                self.nodes.insert(path.clone(), TreeNode::new(path.clone(), kind));
                self.roots.insert(path);
            }
            Some(anchor) => {
                if !self.nodes.get(&anchor).map(TreeNode::is_dir).unwrap_or(false) {
                    return Err(TreeError::NotADirectory(anchor));
                }
                let mut parent = anchor;
                for dir in gap.into_iter().rev() {
                    self.nodes
                        .entry(dir.clone())
                        .or_insert_with(|| TreeNode::new_dir(dir.clone()));
                    if let Some(node) = self.nodes.get_mut(&parent) {
                        node.children.insert(dir.clone());
                    }
                    parent = dir;
                }
                self.nodes.insert(path.clone(), TreeNode::new(path.clone(), kind));
                if let Some(node) = self.nodes.get_mut(&parent) {
                    node.children.insert(path);
                }
            }
        }
        Ok(())
    }

    /// Insert a file node.
    pub fn insert_file(&mut self, path: impl Into<PathBuf>, size: u64) -> TreeResult<()> {
        self.insert(path, NodeKind::File { size })
    }

    /// Insert a directory node.
    pub fn insert_dir(&mut self, path: impl Into<PathBuf>) -> TreeResult<()> {
        self.insert(path, NodeKind::Directory)
    }

    // ---------------------------------------------------------------
    // Removal / restructuring
    // ---------------------------------------------------------------

    /// Remove a node and its whole subtree. The only detach operation.
    ///
    /// Returns the removed node (children set as it was at removal time).
    pub fn remove(&mut self, path: &Path) -> TreeResult<TreeNode> {
        if !self.nodes.contains_key(path) {
            return Err(TreeError::PathNotFound(path.to_path_buf()));
        }
        self.detach_from_parent(path);
        self.roots.remove(path);

        let mut removed = None;
        let mut stack = vec![path.to_path_buf()];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                stack.extend(node.children.iter().cloned());
                if current == path {
                    removed = Some(node);
                }
            }
        }
        removed.ok_or_else(|| TreeError::PathNotFound(path.to_path_buf()))
    }

    /// Collapse all descendant files of `dir` into `dir` itself.
    ///
    /// Descendant directories disappear from the arena; the files become
    /// direct children (keeping their original absolute paths). Irreversible.
    /// Returns the flattened file paths in traversal order.
    pub fn flatten(&mut self, dir: &Path) -> TreeResult<Vec<PathBuf>> {
        let node = self
            .nodes
            .get(dir)
            .ok_or_else(|| TreeError::PathNotFound(dir.to_path_buf()))?;
        if !node.is_dir() {
            return Err(TreeError::NotADirectory(dir.to_path_buf()));
        }

        let files = self.files_under(dir)?;
        let file_nodes: Vec<TreeNode> = files
            .iter()
            .filter_map(|f| self.nodes.get(f).cloned())
            .collect();

        // Drop every current child subtree, then reattach the files flat.
        let children: Vec<PathBuf> = self
            .nodes
            .get(dir)
            .map(|n| n.children.iter().cloned().collect())
            .unwrap_or_default();
        for child in children {
            let mut stack = vec![child];
            while let Some(current) = stack.pop() {
                if let Some(removed) = self.nodes.remove(&current) {
                    stack.extend(removed.children.iter().cloned());
                }
            }
        }

        for file_node in file_nodes {
            self.nodes.insert(file_node.path.clone(), file_node);
        }
        if let Some(node) = self.nodes.get_mut(dir) {
            node.children = files.iter().cloned().collect();
        }
        Ok(files)
    }

    /// Merge the children of directory `from` into directory `into`, then
    /// drop the now-empty `from` node.
    ///
    /// The moved children keep their original absolute path keys.
    pub fn merge(&mut self, from: &Path, into: &Path) -> TreeResult<()> {
        for dir in [from, into] {
            let node = self
                .nodes
                .get(dir)
                .ok_or_else(|| TreeError::PathNotFound(dir.to_path_buf()))?;
            if !node.is_dir() {
                return Err(TreeError::NotADirectory(dir.to_path_buf()));
            }
        }

        let moved: BTreeSet<PathBuf> = self
            .nodes
            .get(from)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        if let Some(target) = self.nodes.get_mut(into) {
            target.children.extend(moved);
        }
        self.detach_from_parent(from);
        self.roots.remove(from);
        self.nodes.remove(from);
        Ok(())
    }

    // ---------------------------------------------------------------
    // Queries
    // ---------------------------------------------------------------

    /// All leaf files under `path` (inclusive for file paths), depth-first
    /// in name order.
    pub fn files_under(&self, path: &Path) -> TreeResult<Vec<PathBuf>> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| TreeError::PathNotFound(path.to_path_buf()))?;
        if node.is_file() {
            return Ok(vec![path.to_path_buf()]);
        }

        let mut files = Vec::new();
        let mut stack: Vec<PathBuf> = node.children.iter().rev().cloned().collect();
        while let Some(current) = stack.pop() {
            if let Some(n) = self.nodes.get(&current) {
                if n.is_file() {
                    files.push(current);
                } else {
                    stack.extend(n.children.iter().rev().cloned());
                }
            }
        }
        Ok(files)
    }

    /// Direct children of `path` in name order.
    pub fn top_level_children(&self, path: &Path) -> TreeResult<Vec<PathBuf>> {
        let node = self
            .nodes
            .get(path)
            .ok_or_else(|| TreeError::PathNotFound(path.to_path_buf()))?;
        if !node.is_dir() {
            return Err(TreeError::NotADirectory(path.to_path_buf()));
        }
        Ok(node.children.iter().cloned().collect())
    }

    fn detach_from_parent(&mut self, path: &Path) {
        if let Some(parent) = path.parent() {
            if let Some(node) = self.nodes.get_mut(parent) {
                if node.children.remove(path) {
                    return;
                }
            }
        }
        // A merge can move a node under a directory other than its path
        // parent while keeping its original key; find the actual owner.
        let owner = self
            .nodes
            .iter()
            .find(|(_, node)| node.children.contains(path))
            .map(|(owner, _)| owner.clone());
        if let Some(owner) = owner {
            if let Some(node) = self.nodes.get_mut(&owner) {
                node.children.remove(path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> FileTree {
        let mut tree = FileTree::new();
        tree.insert_dir("/data").unwrap();
        tree.insert_file("/data/docs/a.txt", 1).unwrap();
        tree.insert_file("/data/docs/b.txt", 2).unwrap();
        tree.insert_file("/data/docs/sub/c.txt", 3).unwrap();
        tree.insert_file("/data/img/x.png", 4).unwrap();
        tree
    }

    #[test]
    fn insert_creates_intermediate_directories() {
        let tree = sample_tree();
        assert!(tree.contains(Path::new("/data/docs")));
        assert!(tree.contains(Path::new("/data/docs/sub")));
        assert!(tree.get(Path::new("/data/docs")).unwrap().is_dir());
        assert_eq!(tree.file_count(), 4);
        // /data is the single root.
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![Path::new("/data")]);
    }

    #[test]
    fn insert_without_ancestor_becomes_root() {
        let mut tree = FileTree::new();
        tree.insert_file("/island/f.txt", 7).unwrap();
        assert_eq!(tree.roots().collect::<Vec<_>>(), vec![Path::new("/island/f.txt")]);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn insert_is_idempotent() {
        let mut tree = sample_tree();
        let before = tree.len();
        tree.insert_file("/data/docs/a.txt", 99).unwrap();
        assert_eq!(tree.len(), before);
        // Original kind kept.
        assert_eq!(
            tree.get(Path::new("/data/docs/a.txt")).unwrap().file_size(),
            Some(1)
        );
    }

    #[test]
    fn insert_under_file_fails() {
        let mut tree = FileTree::new();
        tree.insert_file("/data/f.txt", 1).unwrap();
        let err = tree.insert_file("/data/f.txt/nested", 1).unwrap_err();
        assert!(matches!(err, TreeError::NotADirectory(_)));
    }

    #[test]
    fn remove_detaches_whole_subtree() {
        let mut tree = sample_tree();
        let removed = tree.remove(Path::new("/data/docs")).unwrap();
        assert!(removed.is_dir());
        assert!(!tree.contains(Path::new("/data/docs/a.txt")));
        assert!(!tree.contains(Path::new("/data/docs/sub/c.txt")));
        assert!(tree.contains(Path::new("/data/img/x.png")));
        // Parent no longer references the removed child.
        let data = tree.get(Path::new("/data")).unwrap();
        assert!(!data.children.contains(Path::new("/data/docs")));
    }

    #[test]
    fn remove_missing_path_errors() {
        let mut tree = FileTree::new();
        let err = tree.remove(Path::new("/nope")).unwrap_err();
        assert!(matches!(err, TreeError::PathNotFound(_)));
    }

    #[test]
    fn files_under_is_depth_first_name_ordered() {
        let tree = sample_tree();
        let files = tree.files_under(Path::new("/data/docs")).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("/data/docs/a.txt"),
                PathBuf::from("/data/docs/b.txt"),
                PathBuf::from("/data/docs/sub/c.txt"),
            ]
        );
    }

    #[test]
    fn files_under_file_path_is_identity() {
        let tree = sample_tree();
        let files = tree.files_under(Path::new("/data/img/x.png")).unwrap();
        assert_eq!(files, vec![PathBuf::from("/data/img/x.png")]);
    }

    #[test]
    fn flatten_collapses_descendants() {
        let mut tree = sample_tree();
        let files = tree.flatten(Path::new("/data/docs")).unwrap();
        assert_eq!(files.len(), 3);
        // Subdirectory is gone; files are now direct children.
        assert!(!tree.contains(Path::new("/data/docs/sub")));
        let docs = tree.get(Path::new("/data/docs")).unwrap();
        assert_eq!(docs.child_count(), 3);
        assert!(docs.children.contains(Path::new("/data/docs/sub/c.txt")));
        assert!(tree.contains(Path::new("/data/docs/sub/c.txt")));
    }

    #[test]
    fn flatten_file_fails() {
        let mut tree = sample_tree();
        let err = tree.flatten(Path::new("/data/img/x.png")).unwrap_err();
        assert!(matches!(err, TreeError::NotADirectory(_)));
    }

    #[test]
    fn merge_moves_children_and_drops_source() {
        let mut tree = sample_tree();
        tree.merge(Path::new("/data/img"), Path::new("/data/docs")).unwrap();
        assert!(!tree.contains(Path::new("/data/img")));
        let docs = tree.get(Path::new("/data/docs")).unwrap();
        assert!(docs.children.contains(Path::new("/data/img/x.png")));
        // The moved file keeps its arena entry under its original key.
        assert!(tree.contains(Path::new("/data/img/x.png")));
    }

    #[test]
    fn remove_after_merge_detaches_from_actual_parent() {
        let mut tree = sample_tree();
        tree.merge(Path::new("/data/img"), Path::new("/data/docs")).unwrap();

        tree.remove(Path::new("/data/img/x.png")).unwrap();
        assert!(!tree.contains(Path::new("/data/img/x.png")));
        let docs = tree.get(Path::new("/data/docs")).unwrap();
        assert!(!docs.children.contains(Path::new("/data/img/x.png")));

        // Every remaining child key still resolves to an arena entry.
        for child in &docs.children {
            assert!(tree.contains(child), "dangling child key {}", child.display());
        }
    }

    #[test]
    fn top_level_children_in_name_order() {
        let tree = sample_tree();
        let children = tree.top_level_children(Path::new("/data")).unwrap();
        assert_eq!(
            children,
            vec![PathBuf::from("/data/docs"), PathBuf::from("/data/img")]
        );
    }
}
