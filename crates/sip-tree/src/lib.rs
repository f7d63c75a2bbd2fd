//! In-memory filesystem tree and path disposition registry.
//!
//! [`FileTree`] mirrors a scanned filesystem subtree as an arena of nodes
//! addressed by absolute path, with no parent back-pointers, so a UI projection
//! can stay a separate read-only view. [`PathRegistry`] is the single source
//! of truth for per-path disposition (normal / ignored / mapped) and is the
//! only structure in the workspace mutated by more than one component
//! concurrently.

pub mod error;
pub mod node;
pub mod registry;
pub mod tree;

pub use error::{TreeError, TreeResult};
pub use node::{name_of, NodeKind, TreeNode};
pub use registry::{PathRegistry, RegistryCounts, RegistryEntry};
pub use tree::FileTree;
