//! The package builder seam and helpers shared by all formats.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use sip_model::PackageAssembly;
use sip_types::ConfigProvider;
use tracing::warn;

use crate::error::{PackError, PackResult};
use crate::format::PackageFormat;
use crate::validate::SchemaValidator;

/// One unit of builder progress, reported per step rather than per byte to
/// bound update frequency.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildStep {
    /// Resolving and validating one metadata document.
    Metadata { id: String },
    /// Streaming one content file into the package.
    CopyFile { path: PathBuf },
    /// Writing manifests and format envelopes.
    Finalize,
}

impl BuildStep {
    /// Short action label for status display.
    pub fn action(&self) -> &'static str {
        match self {
            BuildStep::Metadata { .. } => "resolving metadata",
            BuildStep::CopyFile { .. } => "copying content",
            BuildStep::Finalize => "finalizing package",
        }
    }
}

/// Serializes one assembly into an on-disk package.
///
/// One implementation per format variant; the builder decides layout and
/// streams bytes, nothing else. Cancellation and batch accounting live in
/// the export job.
pub trait PackageBuilder: Send + Sync {
    fn format(&self) -> PackageFormat;

    /// Write `assembly` as a package under `output_dir`, returning the
    /// produced package path. `progress` is invoked once per build step.
    fn build(
        &self,
        assembly: &PackageAssembly,
        output_dir: &Path,
        config: &dyn ConfigProvider,
        validator: &dyn SchemaValidator,
        progress: &mut dyn FnMut(BuildStep),
    ) -> PackResult<PathBuf>;
}

/// A resolved metadata document ready to be written.
pub(crate) struct ResolvedMetadata {
    pub id: String,
    pub content: String,
}

/// Expand placeholders and validate every metadata entry of `assembly`.
///
/// A failed validation is surfaced as a warning, not an error: the package
/// is still produced and the verdict is the caller's to act on.
pub(crate) fn resolve_metadata(
    assembly: &PackageAssembly,
    config: &dyn ConfigProvider,
    validator: &dyn SchemaValidator,
    progress: &mut dyn FnMut(BuildStep),
) -> Vec<ResolvedMetadata> {
    let mut resolved = Vec::with_capacity(assembly.metadata.len());
    for entry in &assembly.metadata {
        progress(BuildStep::Metadata {
            id: entry.id.clone(),
        });
        let content = entry.resolved_content(config);
        let verdict = validator.validate(&content, entry.schema.as_ref());
        if !verdict.valid {
            warn!(
                assembly = %assembly.id,
                metadata = %entry.id,
                diagnostic = %verdict.diagnostic,
                "metadata failed validation"
            );
        }
        resolved.push(ResolvedMetadata {
            id: entry.id.clone(),
            content,
        });
    }
    resolved
}

/// Directory name for a package: sanitized title plus the short assembly id
/// so equally-titled assemblies in one batch never collide.
pub(crate) fn package_dir_name(assembly: &PackageAssembly) -> String {
    let title: String = assembly
        .title
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}-{}", title, assembly.id.short_id())
}

/// Stream `src` into `dst` (creating parent directories), returning the
/// byte count and SHA-256 digest of the copied content.
pub(crate) fn copy_with_digest(src: &Path, dst: &Path) -> PackResult<(u64, String)> {
    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut reader = File::open(src).map_err(|source| PackError::SourceFile {
        path: src.to_path_buf(),
        source,
    })?;
    let mut writer = File::create(dst)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    let mut total = 0u64;
    loop {
        let n = reader.read(&mut buf).map_err(|source| PackError::SourceFile {
            path: src.to_path_buf(),
            source,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        writer.write_all(&buf[..n])?;
        total += n as u64;
    }
    writer.flush()?;
    Ok((total, hex::encode(hasher.finalize())))
}

/// One file written into a package, with its payload accounting.
pub(crate) struct WrittenFile {
    pub path: PathBuf,
    pub bytes: u64,
    pub digest: String,
}

/// Copy every documentation reference of `assembly` under `target`.
/// Directory references are copied recursively.
pub(crate) fn copy_documentation(
    assembly: &PackageAssembly,
    target: &Path,
    progress: &mut dyn FnMut(BuildStep),
) -> PackResult<Vec<WrittenFile>> {
    let mut written = Vec::new();
    for doc in &assembly.documentation {
        if doc.is_dir() {
            for entry in walkdir::WalkDir::new(doc).sort_by_file_name() {
                let entry = entry.map_err(|e| PackError::SourceFile {
                    path: doc.clone(),
                    source: e.into(),
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry
                    .path()
                    .strip_prefix(doc)
                    .unwrap_or_else(|_| Path::new(""));
                let name = doc.file_name().map(PathBuf::from).unwrap_or_default();
                let dst = target.join(name).join(rel);
                progress(BuildStep::CopyFile {
                    path: entry.path().to_path_buf(),
                });
                let (bytes, digest) = copy_with_digest(entry.path(), &dst)?;
                written.push(WrittenFile {
                    path: dst,
                    bytes,
                    digest,
                });
            }
        } else {
            let name = doc.file_name().map(PathBuf::from).unwrap_or_default();
            let dst = target.join(name);
            progress(BuildStep::CopyFile { path: doc.clone() });
            let (bytes, digest) = copy_with_digest(doc, &dst)?;
            written.push(WrittenFile {
                path: dst,
                bytes,
                digest,
            });
        }
    }
    Ok(written)
}

/// A package-relative path rendered with forward slashes, as manifests
/// expect.
pub(crate) fn posix_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Minimal XML text escaping for generated envelopes.
pub(crate) fn xml_escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}
