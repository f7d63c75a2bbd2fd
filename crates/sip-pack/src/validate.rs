//! Schema validation seam.
//!
//! The deep XML schema machinery is an external collaborator; this layer
//! only needs a pass/fail verdict with a diagnostic.

use sip_model::SchemaRef;

/// Outcome of validating one metadata document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validation {
    pub valid: bool,
    pub diagnostic: String,
}

impl Validation {
    pub fn ok() -> Self {
        Self {
            valid: true,
            diagnostic: String::new(),
        }
    }

    pub fn fail(diagnostic: impl Into<String>) -> Self {
        Self {
            valid: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Validates metadata content against its declared schema.
pub trait SchemaValidator: Send + Sync {
    fn validate(&self, content: &str, schema: Option<&SchemaRef>) -> Validation;
}

/// Default validator: surface-level checks only, never consults the schema.
///
/// Accepts any non-empty document that looks like markup when a schema is
/// declared; real schema validation is plugged in by the caller.
#[derive(Debug, Default)]
pub struct PermissiveValidator;

impl SchemaValidator for PermissiveValidator {
    fn validate(&self, content: &str, schema: Option<&SchemaRef>) -> Validation {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Validation::fail("metadata content is empty");
        }
        if schema.is_some() && !trimmed.starts_with('<') {
            return Validation::fail("schema declared but content is not markup");
        }
        Validation::ok()
    }
}
