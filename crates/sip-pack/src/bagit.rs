//! BagIt 0.97 bags with a SHA-256 payload manifest.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sip_model::PackageAssembly;
use sip_types::ConfigProvider;

use crate::builder::{
    copy_documentation, copy_with_digest, package_dir_name, posix_path, resolve_metadata,
    BuildStep, PackageBuilder,
};
use crate::error::PackResult;
use crate::format::PackageFormat;
use crate::validate::SchemaValidator;

/// Configuration key for the `Source-Organization` bag-info field.
pub const SOURCE_ORGANIZATION_KEY: &str = "bagit.source-organization";

const BAGIT_DECLARATION: &str = "BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n";

/// Builds a bag per the BagIt spec: declaration, `bag-info.txt`, payload
/// under `data/`, and a `manifest-sha256.txt` covering every payload file.
/// Metadata documents are written as tag files under `metadata/`.
#[derive(Debug, Default)]
pub struct BagItBuilder;

impl BagItBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl PackageBuilder for BagItBuilder {
    fn format(&self) -> PackageFormat {
        PackageFormat::BagIt
    }

    fn build(
        &self,
        assembly: &PackageAssembly,
        output_dir: &Path,
        config: &dyn ConfigProvider,
        validator: &dyn SchemaValidator,
        progress: &mut dyn FnMut(BuildStep),
    ) -> PackResult<PathBuf> {
        let bag_dir = output_dir.join(package_dir_name(assembly));
        fs::create_dir_all(bag_dir.join("data"))?;

        for doc in resolve_metadata(assembly, config, validator, progress) {
            let path = bag_dir.join("metadata").join(format!("{}.xml", doc.id));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, doc.content)?;
        }

        // Payload: (bag-relative posix path, digest), plus oxum accounting.
        let mut manifest: Vec<(String, String)> = Vec::new();
        let mut payload_bytes = 0u64;

        for representation in &assembly.representations {
            let rep_root = PathBuf::from("data").join(&representation.name);
            for file in representation.files() {
                progress(BuildStep::CopyFile { path: file.clone() });
                let rel = rep_root.join(representation.relative_path(file));
                let (bytes, digest) = copy_with_digest(file, &bag_dir.join(&rel))?;
                payload_bytes += bytes;
                manifest.push((posix_path(&rel), digest));
            }
        }

        for written in
            copy_documentation(assembly, &bag_dir.join("data/documentation"), progress)?
        {
            payload_bytes += written.bytes;
            if let Ok(rel) = written.path.strip_prefix(&bag_dir) {
                manifest.push((posix_path(rel), written.digest));
            }
        }

        progress(BuildStep::Finalize);
        fs::write(bag_dir.join("bagit.txt"), BAGIT_DECLARATION)?;

        let mut manifest_body = String::new();
        for (rel, digest) in &manifest {
            manifest_body.push_str(&format!("{digest}  {rel}\n"));
        }
        fs::write(bag_dir.join("manifest-sha256.txt"), manifest_body)?;

        let organization = config
            .get(SOURCE_ORGANIZATION_KEY)
            .unwrap_or_else(|| crate::mets::DEFAULT_AGENT.to_string());
        let info = format!(
            "Bagging-Date: {}\n\
             Source-Organization: {}\n\
             External-Identifier: {}\n\
             External-Description: {}\n\
             Payload-Oxum: {}.{}\n",
            Utc::now().format("%Y-%m-%d"),
            organization,
            assembly.id,
            assembly.title,
            payload_bytes,
            manifest.len(),
        );
        fs::write(bag_dir.join("bag-info.txt"), info)?;

        Ok(bag_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sip_model::Representation;
    use sip_types::MapConfig;

    use crate::validate::PermissiveValidator;

    #[test]
    fn bag_layout_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("sub")).unwrap();
        fs::write(src.join("a.txt"), b"aaaa").unwrap();
        fs::write(src.join("sub/b.txt"), b"bb").unwrap();

        let mut rep = Representation::new("rep1").with_base(&src);
        rep.add_file(src.join("a.txt"));
        rep.add_file(src.join("sub/b.txt"));
        let mut assembly = PackageAssembly::new("docs");
        assembly.add_representation(rep);

        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();
        let config = MapConfig::new().with(SOURCE_ORGANIZATION_KEY, "Test Org");

        let bag = BagItBuilder::new()
            .build(&assembly, &out, &config, &PermissiveValidator, &mut |_| {})
            .unwrap();

        assert!(fs::read_to_string(bag.join("bagit.txt"))
            .unwrap()
            .starts_with("BagIt-Version: 0.97"));
        assert!(bag.join("data/rep1/a.txt").is_file());
        assert!(bag.join("data/rep1/sub/b.txt").is_file());

        let manifest = fs::read_to_string(bag.join("manifest-sha256.txt")).unwrap();
        let lines: Vec<&str> = manifest.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|l| l.ends_with("data/rep1/a.txt")));
        assert!(lines.iter().any(|l| l.ends_with("data/rep1/sub/b.txt")));
        // 64 hex chars, two spaces, path.
        assert_eq!(lines[0].split("  ").next().unwrap().len(), 64);

        let info = fs::read_to_string(bag.join("bag-info.txt")).unwrap();
        assert!(info.contains("Source-Organization: Test Org"));
        assert!(info.contains("Payload-Oxum: 6.2"));
    }

    #[test]
    fn documentation_lands_in_payload() {
        let dir = tempfile::tempdir().unwrap();
        let readme = dir.path().join("README.txt");
        fs::write(&readme, b"hello").unwrap();

        let mut assembly = PackageAssembly::new("with-docs");
        assembly.add_documentation(&readme);

        let out = dir.path().join("out");
        fs::create_dir_all(&out).unwrap();

        let bag = BagItBuilder::new()
            .build(
                &assembly,
                &out,
                &MapConfig::new(),
                &PermissiveValidator,
                &mut |_| {},
            )
            .unwrap();

        assert!(bag.join("data/documentation/README.txt").is_file());
        let manifest = fs::read_to_string(bag.join("manifest-sha256.txt")).unwrap();
        assert!(manifest.contains("data/documentation/README.txt"));
    }
}
