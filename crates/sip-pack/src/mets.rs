//! METS header envelope and the METS-header profile builder.
//!
//! Only the header-level envelope is owned here: OBJID, label, record
//! status, and the creating agent. Full structural-map serialization is an
//! external concern.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use sip_model::{PackageAssembly, SipStatus};
use sip_types::ConfigProvider;

use crate::builder::{
    copy_documentation, copy_with_digest, package_dir_name, resolve_metadata, xml_escape,
    BuildStep, PackageBuilder,
};
use crate::error::PackResult;
use crate::format::PackageFormat;
use crate::validate::SchemaValidator;

/// Configuration key for the creating agent name in generated envelopes.
pub const AGENT_NAME_KEY: &str = "mets.agent.name";
/// Fallback agent name when the key is not configured.
pub const DEFAULT_AGENT: &str = "sipforge";

/// Render the header-only METS document for `assembly`.
pub(crate) fn write_mets_skeleton(
    assembly: &PackageAssembly,
    profile: &str,
    config: &dyn ConfigProvider,
) -> String {
    let agent = config
        .get(AGENT_NAME_KEY)
        .unwrap_or_else(|| DEFAULT_AGENT.to_string());
    let status = match assembly.status {
        SipStatus::New => "NEW",
        SipStatus::Update => "UPDATE",
    };
    let created = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let ancestors = assembly
        .ancestors
        .iter()
        .map(|a| format!("    <note>ancestor: {}</note>\n", xml_escape(a)))
        .collect::<String>();

    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <mets xmlns=\"http://www.loc.gov/METS/\"\n\
         \x20     OBJID=\"{objid}\"\n\
         \x20     LABEL=\"{label}\"\n\
         \x20     TYPE=\"{level}\"\n\
         \x20     PROFILE=\"{profile}\">\n\
         \x20 <metsHdr CREATEDATE=\"{created}\" RECORDSTATUS=\"{status}\">\n\
         \x20   <agent ROLE=\"CREATOR\" TYPE=\"OTHER\" OTHERTYPE=\"SOFTWARE\">\n\
         \x20     <name>{agent}</name>\n\
         {ancestors}\
         \x20   </agent>\n\
         \x20 </metsHdr>\n\
         </mets>\n",
        objid = assembly.id,
        label = xml_escape(&assembly.title),
        level = xml_escape(&assembly.level.to_string()),
        profile = xml_escape(profile),
        created = created,
        status = status,
        agent = xml_escape(&agent),
        ancestors = ancestors,
    )
}

/// METS-header profile: a plain package directory with a header-only
/// `METS.xml`, metadata documents, and content laid out per representation.
#[derive(Debug, Default)]
pub struct MetsHeaderBuilder;

impl MetsHeaderBuilder {
    pub fn new() -> Self {
        Self
    }
}

const METS_HEADER_PROFILE: &str = "https://sipforge.dev/profiles/mets-header";

impl PackageBuilder for MetsHeaderBuilder {
    fn format(&self) -> PackageFormat {
        PackageFormat::MetsHeader
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
        fs::create_dir_all(&pkg_dir)?;

        for doc in resolve_metadata(assembly, config, validator, progress) {
            let path = pkg_dir.join("metadata").join(format!("{}.xml", doc.id));
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, doc.content)?;
        }

        for representation in &assembly.representations {
            let rep_dir = pkg_dir.join("content").join(&representation.name);
            for file in representation.files() {
                progress(BuildStep::CopyFile { path: file.clone() });
                let dst = rep_dir.join(representation.relative_path(file));
                copy_with_digest(file, &dst)?;
            }
        }

        copy_documentation(assembly, &pkg_dir.join("documentation"), progress)?;

        progress(BuildStep::Finalize);
        fs::write(
            pkg_dir.join("METS.xml"),
            write_mets_skeleton(assembly, METS_HEADER_PROFILE, config),
        )?;
        Ok(pkg_dir)
    }
}
