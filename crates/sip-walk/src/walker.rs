//! The background tree walker.
//!
//! One dedicated worker thread per walk. The caller never blocks: it holds
//! a [`WalkHandle`] to poll or cancel, and joins for the final
//! [`WalkStats`]. Cancellation is cooperative and re-checked after every
//! visited entry.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use sip_tree::PathRegistry;

use crate::error::{WalkError, WalkResult};
use crate::filter::IgnoreFilter;
use crate::visitor::{Flow, WalkVisitor};

/// Aggregate outcome of one walk.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkStats {
    pub visited_files: u64,
    pub visited_dirs: u64,
    pub ignored: u64,
    pub failed: u64,
    /// `true` when the walk stopped at a cancellation checkpoint instead of
    /// running to completion.
    pub cancelled: bool,
}

/// Handle to a running walk.
pub struct WalkHandle {
    cancel: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    worker: Option<JoinHandle<WalkStats>>,
}

impl WalkHandle {
    /// Request a cooperative stop at the next checkpoint.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Returns `true` once the worker has finished (completed or stopped).
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Relaxed)
    }

    /// Wait for the walk to finish and return its stats.
    pub fn join(mut self) -> WalkResult<WalkStats> {
        match self.worker.take() {
            Some(worker) => worker.join().map_err(|_| WalkError::WorkerPanicked),
            None => Err(WalkError::WorkerPanicked),
        }
    }
}

/// Depth-first, cancellable traversal of one or more root paths.
pub struct TreeWalker {
    filter: IgnoreFilter,
    registry: Arc<PathRegistry>,
}

impl TreeWalker {
    /// Create a walker with the given ignore filter and registry.
    pub fn new(filter: IgnoreFilter, registry: Arc<PathRegistry>) -> Self {
        Self { filter, registry }
    }

    /// Start walking `roots` on a dedicated background thread.
    ///
    /// For every entry under each root, depth-first pre-order, the visitor's
    /// hooks are invoked; a directory's post-visit always runs after all of
    /// its descendants. Ignored entries are recorded in the registry without
    /// constructing descendant state. Symbolic links are never followed;
    /// a link is reported as a file entry. The visitor's `end` hook runs
    /// exactly once when the walk finishes, stops, or is cancelled.
    pub fn walk<V: WalkVisitor + 'static>(self, roots: Vec<PathBuf>, visitor: V) -> WalkHandle {
        let cancel = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let worker_cancel = Arc::clone(&cancel);
        let worker_finished = Arc::clone(&finished);
        let worker = std::thread::spawn(move || {
            let mut worker = WalkWorker {
                filter: self.filter,
                registry: self.registry,
                visitor,
                cancel: worker_cancel,
                stats: WalkStats::default(),
            };
            let stats = worker.run(&roots);
            worker_finished.store(true, Ordering::Relaxed);
            stats
        });

        WalkHandle {
            cancel,
            finished,
            worker: Some(worker),
        }
    }
}

struct WalkWorker<V: WalkVisitor> {
    filter: IgnoreFilter,
    registry: Arc<PathRegistry>,
    visitor: V,
    cancel: Arc<AtomicBool>,
    stats: WalkStats,
}

impl<V: WalkVisitor> WalkWorker<V> {
    fn run(&mut self, roots: &[PathBuf]) -> WalkStats {
        tracing::debug!(roots = roots.len(), "walk started");
        for root in roots {
            if self.stopped() {
                break;
            }
            self.visit_entry(root);
        }
        // Exactly once, however the walk ended.
        self.visitor.end();
        self.stats.cancelled = self.stopped();
        tracing::debug!(
            files = self.stats.visited_files,
            dirs = self.stats.visited_dirs,
            ignored = self.stats.ignored,
            failed = self.stats.failed,
            cancelled = self.stats.cancelled,
            "walk finished"
        );
        self.stats
    }

    fn stopped(&self) -> bool {
        self.cancel.load(Ordering::Relaxed)
    }

    fn stop(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    fn visit_entry(&mut self, path: &Path) {
        if self.stopped() {
            return;
        }
        // symlink_metadata so links are never followed; a link to a
        // directory would otherwise cycle the walk through its own ancestors.
        let metadata = match std::fs::symlink_metadata(path) {
            Ok(m) => m,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "entry unreadable");
                self.stats.failed += 1;
                self.visitor.visit_file_failed(path, &e);
                return;
            }
        };
        let is_dir = metadata.file_type().is_dir();

        // Filter first: ignored entries get a registry record and nothing else.
        if self.filter.matches(path, is_dir) {
            self.registry.set_ignored(path);
            self.stats.ignored += 1;
            return;
        }

        if is_dir {
            self.visit_dir(path);
        } else {
            // Symlinks land here as plain leaf entries.
            self.stats.visited_files += 1;
            if self.visitor.visit_file(path, metadata.len()) == Flow::Stop {
                self.stop();
            }
        }
    }

    fn visit_dir(&mut self, path: &Path) {
        match self.visitor.pre_visit_directory(path) {
            Flow::SkipSubtree => return,
            Flow::Stop => {
                self.stop();
                return;
            }
            Flow::Continue => {}
        }
        self.stats.visited_dirs += 1;

        let mut children = Vec::new();
        match std::fs::read_dir(path) {
            Ok(read_dir) => {
                for entry in read_dir {
                    match entry {
                        Ok(entry) => children.push(entry.path()),
                        Err(e) => {
                            self.stats.failed += 1;
                            self.visitor.visit_file_failed(path, &e);
                        }
                    }
                }
            }
            Err(e) => {
                self.stats.failed += 1;
                self.visitor.visit_file_failed(path, &e);
                // Keep the pre/post pairing even for unreadable directories.
                self.visitor.post_visit_directory(path);
                return;
            }
        }
        children.sort();

        for child in children {
            if self.stopped() {
                return;
            }
            self.visit_entry(&child);
        }

        if self.stopped() {
            return;
        }
        self.visitor.post_visit_directory(path);
    }
}
