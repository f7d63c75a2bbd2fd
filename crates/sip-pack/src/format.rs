use std::fmt;
use std::str::FromStr;

use crate::bagit::BagItBuilder;
use crate::builder::PackageBuilder;
use crate::eark::{EArkBuilder, EArkVersion};
use crate::error::PackError;
use crate::mets::MetsHeaderBuilder;

/// Supported export package formats. Closed set; each variant has exactly
/// one [`PackageBuilder`] implementation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PackageFormat {
    /// BagIt 0.97 bag with a SHA-256 payload manifest.
    #[default]
    BagIt,
    /// E-ARK information package, v1 profile.
    EArkV1,
    /// E-ARK information package, v2 profile.
    EArkV2,
    /// Plain package directory with a header-only METS document.
    MetsHeader,
}

impl PackageFormat {
    pub const ALL: [PackageFormat; 4] = [
        PackageFormat::BagIt,
        PackageFormat::EArkV1,
        PackageFormat::EArkV2,
        PackageFormat::MetsHeader,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PackageFormat::BagIt => "bagit",
            PackageFormat::EArkV1 => "eark1",
            PackageFormat::EArkV2 => "eark2",
            PackageFormat::MetsHeader => "mets-header",
        }
    }

    /// Construct the builder implementing this format.
    pub fn builder(&self) -> Box<dyn PackageBuilder> {
        match self {
            PackageFormat::BagIt => Box::new(BagItBuilder::new()),
            PackageFormat::EArkV1 => Box::new(EArkBuilder::new(EArkVersion::V1)),
            PackageFormat::EArkV2 => Box::new(EArkBuilder::new(EArkVersion::V2)),
            PackageFormat::MetsHeader => Box::new(MetsHeaderBuilder::new()),
        }
    }
}

impl fmt::Display for PackageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageFormat {
    type Err = PackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bagit" => Ok(PackageFormat::BagIt),
            "eark1" => Ok(PackageFormat::EArkV1),
            "eark2" => Ok(PackageFormat::EArkV2),
            "mets-header" => Ok(PackageFormat::MetsHeader),
            other => Err(PackError::UnknownFormat(other.to_string())),
        }
    }
}
