//! E-ARK information package layout, v1 and v2 profiles.
//!
//! Both versions share the IP shape: a root METS envelope,
//! `metadata/descriptive/` documents, per-representation `data/` payloads,
//! and `documentation/`. The profile marker and preservation-metadata
//! area differ between versions.

use std::fs;
use std::path::{Path, PathBuf};

use sip_model::PackageAssembly;
use sip_types::ConfigProvider;

use crate::builder::{
    copy_documentation, copy_with_digest, package_dir_name, resolve_metadata, BuildStep,
    PackageBuilder,
};
use crate::error::PackResult;
use crate::format::PackageFormat;
use crate::mets::write_mets_skeleton;
use crate::validate::SchemaValidator;

/// E-ARK profile generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EArkVersion {
    V1,
    V2,
}

impl EArkVersion {
    fn profile(&self) -> &'static str {
        match self {
            EArkVersion::V1 => "http://www.eark-project.com/METS/IP.xml",
            EArkVersion::V2 => "https://earkcsip.dilcis.eu/profile/E-ARK-CSIP.xml",
        }
    }
}

/// Builds an E-ARK information package for one profile generation.
#[derive(Debug)]
pub struct EArkBuilder {
    version: EArkVersion,
}

impl EArkBuilder {
    pub fn new(version: EArkVersion) -> Self {
        Self { version }
    }
}

impl PackageBuilder for EArkBuilder {
    fn format(&self) -> PackageFormat {
        match self.version {
            EArkVersion::V1 => PackageFormat::EArkV1,
            EArkVersion::V2 => PackageFormat::EArkV2,
        }
    }

    fn build(
        &self,
        assembly: &PackageAssembly,
        output_dir: &Path,
        config: &dyn ConfigProvider,
        validator: &dyn SchemaValidator,
        progress: &mut dyn FnMut(BuildStep),
    ) -> PackResult<PathBuf> {
        let pkg_dir = output_dir.join(package_dir_name(assembly));
        let descriptive = pkg_dir.join("metadata/descriptive");
        fs::create_dir_all(&descriptive)?;
        if self.version == EArkVersion::V2 {
            fs::create_dir_all(pkg_dir.join("metadata/preservation"))?;
        }

        for doc in resolve_metadata(assembly, config, validator, progress) {
            fs::write(descriptive.join(format!("{}.xml", doc.id)), doc.content)?;
        }

        for representation in &assembly.representations {
            let data_dir = pkg_dir
                .join("representations")
                .join(&representation.name)
                .join("data");
            for file in representation.files() {
                progress(BuildStep::CopyFile { path: file.clone() });
                let dst = data_dir.join(representation.relative_path(file));
                copy_with_digest(file, &dst)?;
            }
        }

        copy_documentation(assembly, &pkg_dir.join("documentation"), progress)?;

        progress(BuildStep::Finalize);
        fs::write(
            pkg_dir.join("METS.xml"),
            write_mets_skeleton(assembly, self.version.profile(), config),
        )?;
        Ok(pkg_dir)
    }
}
