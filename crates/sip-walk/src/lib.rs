//! Background filesystem traversal.
//!
//! [`TreeWalker`] runs a depth-first walk of one or more root paths on a
//! dedicated thread, applying an [`IgnoreFilter`] and feeding a
//! [`WalkVisitor`]. The walk is cooperative: cancellation is re-checked
//! after every visited entry, unreadable entries are reported and skipped,
//! and the visitor's `end` hook runs exactly once however the walk stops.

pub mod builder;
pub mod error;
pub mod filter;
pub mod visitor;
pub mod walker;

pub use builder::TreeBuilder;
pub use error::{WalkError, WalkResult};
pub use filter::IgnoreFilter;
pub use visitor::{Flow, WalkVisitor};
pub use walker::{TreeWalker, WalkHandle, WalkStats};
