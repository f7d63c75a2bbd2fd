use std::path::Path;

/// Visitor control flow, returned by the pre-directory and file hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    /// Keep walking.
    Continue,
    /// Skip this directory's descendants (pre-directory hook only).
    SkipSubtree,
    /// Stop the whole walk at the next checkpoint, as if cancelled.
    Stop,
}

/// Callbacks fed by a [`TreeWalker`](crate::TreeWalker) during traversal.
///
/// Hooks are invoked depth-first: `pre_visit_directory` before any of a
/// directory's entries, `post_visit_directory` after all of them (the
/// ordering bottom-up aggregation relies on). Unreadable entries arrive at
/// `visit_file_failed` and never abort the walk. `end` runs exactly once,
/// whether the walk completes, stops, or is cancelled.
pub trait WalkVisitor: Send {
    fn pre_visit_directory(&mut self, path: &Path) -> Flow {
        let _ = path;
        Flow::Continue
    }

    fn visit_file(&mut self, path: &Path, size: u64) -> Flow {
        let _ = (path, size);
        Flow::Continue
    }

    fn visit_file_failed(&mut self, path: &Path, error: &std::io::Error) {
        let _ = (path, error);
    }

    fn post_visit_directory(&mut self, path: &Path) {
        let _ = path;
    }

    fn end(&mut self) {}
}
