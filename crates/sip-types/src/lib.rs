//! Foundation types for sipforge.
//!
//! This crate provides the identifier, disposition, and configuration types
//! used throughout the workspace. Every other sipforge crate depends on
//! `sip-types`.
//!
//! # Key Types
//!
//! - [`RuleId`] / [`AssemblyId`]: time-ordered identifiers (UUID v7)
//! - [`PathState`]: disposition of a filesystem path (normal / ignored / mapped)
//! - [`DescriptionLevel`]: archival description level of a package
//! - [`ConfigProvider`]: opaque key-to-string configuration lookup

pub mod config;
pub mod error;
pub mod id;
pub mod level;
pub mod state;

pub use config::{expand_placeholders, ConfigProvider, MapConfig, TomlConfig};
pub use error::{TypeError, TypeResult};
pub use id::{AssemblyId, RuleId};
pub use level::DescriptionLevel;
pub use state::PathState;
