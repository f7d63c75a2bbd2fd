//! The standard scan visitor: populates a [`FileTree`] during a walk.

use std::path::Path;
use std::sync::{Arc, Mutex};

use sip_tree::FileTree;

use crate::visitor::{Flow, WalkVisitor};

/// A [`WalkVisitor`] that mirrors every visited entry into a shared
/// [`FileTree`].
///
/// The tree is shared behind a mutex so the caller can inspect it while the
/// walk is still running and keep it after the walk ends. Failed entries
/// are treated as absent: nothing is inserted for them.
#[derive(Clone, Default)]
pub struct TreeBuilder {
    tree: Arc<Mutex<FileTree>>,
}

impl TreeBuilder {
    /// Create a builder around an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared handle to the tree under construction.
    pub fn tree(&self) -> Arc<Mutex<FileTree>> {
        Arc::clone(&self.tree)
    }
}

impl WalkVisitor for TreeBuilder {
    fn pre_visit_directory(&mut self, path: &Path) -> Flow {
        let mut tree = self.tree.lock().expect("tree lock poisoned");
        if let Err(e) = tree.insert_dir(path) {
            tracing::warn!(path = %path.display(), error = %e, "could not insert directory");
        }
        Flow::Continue
    }

    fn visit_file(&mut self, path: &Path, size: u64) -> Flow {
        let mut tree = self.tree.lock().expect("tree lock poisoned");
        if let Err(e) = tree.insert_file(path, size) {
            tracing::warn!(path = %path.display(), error = %e, "could not insert file");
        }
        Flow::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::IgnoreFilter;
    use crate::walker::TreeWalker;
    use sip_tree::PathRegistry;

    #[test]
    fn builder_mirrors_walked_tree_minus_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::create_dir(dir.path().join("img")).unwrap();
        for file in ["docs/r1.txt", "docs/r2.txt", "docs/r3.txt", "img/p1.png", "img/p2.png"] {
            std::fs::write(dir.path().join(file), b"content").unwrap();
        }
        std::fs::write(dir.path().join("docs/scratch.tmp"), b"x").unwrap();

        let registry = Arc::new(PathRegistry::new());
        let builder = TreeBuilder::new();
        let tree_handle = builder.tree();

        let walker = TreeWalker::new(IgnoreFilter::new(&["*.tmp"]).unwrap(), Arc::clone(&registry));
        let stats = walker.walk(vec![dir.path().to_path_buf()], builder).join().unwrap();

        let tree = tree_handle.lock().unwrap();
        assert_eq!(stats.visited_files, 5);
        assert_eq!(stats.ignored, 1);
        assert_eq!(tree.file_count(), 5);
        assert!(tree.contains(&dir.path().join("docs/r1.txt")));
        assert!(!tree.contains(&dir.path().join("docs/scratch.tmp")));
        assert!(registry.state(&dir.path().join("docs/scratch.tmp")).is_ignored());
    }
}
