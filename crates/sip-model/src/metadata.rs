use serde::{Deserialize, Serialize};
use sip_types::{expand_placeholders, ConfigProvider};

/// Reference to the schema a metadata entry should validate against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRef {
    /// Schema location (path or URI), resolved by the validator.
    pub location: String,
    pub version: Option<String>,
}

impl SchemaRef {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// One descriptive metadata document attached to an assembly.
///
/// The content may contain `${key}` placeholders; they are expanded against
/// the session configuration at packaging time, not before.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    /// Identifier used for the on-disk metadata file name.
    pub id: String,
    /// Metadata type label (e.g. `dublin-core`, `ead`).
    pub metadata_type: String,
    pub version: Option<String>,
    /// Raw (possibly templated) metadata content.
    pub content: String,
    pub schema: Option<SchemaRef>,
}

impl MetadataEntry {
    pub fn new(
        id: impl Into<String>,
        metadata_type: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            metadata_type: metadata_type.into(),
            version: None,
            content: content.into(),
            schema: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_schema(mut self, schema: SchemaRef) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Content with `${key}` placeholders expanded from `config`.
    pub fn resolved_content(&self, config: &dyn ConfigProvider) -> String {
        expand_placeholders(&self.content, config)
    }
}
