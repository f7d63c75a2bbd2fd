//! The packaging pipeline: per-format package builders and the background
//! export job.
//!
//! A [`PackageBuilder`] serializes one [`PackageAssembly`] into an on-disk
//! package in one of the supported [`PackageFormat`]s. The [`ExportJob`]
//! runs a whole batch on a dedicated worker thread, tracking aggregate
//! progress and ETA, isolating per-item failures, and optionally emitting
//! an inventory report correlating each output path to its source assembly.
//!
//! [`PackageAssembly`]: sip_model::PackageAssembly

pub mod bagit;
pub mod builder;
pub mod eark;
pub mod error;
pub mod format;
pub mod job;
pub mod mets;
pub mod report;
pub mod validate;

pub use bagit::BagItBuilder;
pub use builder::{BuildStep, PackageBuilder};
pub use eark::{EArkBuilder, EArkVersion};
pub use error::{PackError, PackResult};
pub use format::PackageFormat;
pub use job::{
    Collaborators, ExportItem, ExportJob, ExportOptions, ExportSummary, REPORT_FILE,
};
pub use mets::MetsHeaderBuilder;
pub use report::{BurstGuard, ErrorSink, InventoryEntry, InventoryReport, NullSink};
pub use validate::{PermissiveValidator, SchemaValidator, Validation};
