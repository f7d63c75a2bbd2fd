//! The virtual package data model.
//!
//! A [`PackageAssembly`] is the in-memory, not-yet-serialized representation
//! of one archival package: descriptive metadata, named representations of
//! content files, documentation references, and ancestry. Only path
//! references are held at this layer; no file bytes are read or copied
//! until packaging.

pub mod assembly;
pub mod metadata;
pub mod representation;

pub use assembly::{PackageAssembly, SipStatus};
pub use metadata::{MetadataEntry, SchemaRef};
pub use representation::Representation;
