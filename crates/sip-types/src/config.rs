//! Configuration lookup for metadata templates, ignore patterns, and
//! per-format options.
//!
//! The rest of the workspace consumes configuration through the narrow
//! [`ConfigProvider`] trait: opaque key → string lookups. Two
//! implementations are provided: [`MapConfig`] (in-memory, used by tests
//! and programmatic callers) and [`TomlConfig`] (loaded from a TOML file,
//! nested tables flattened into dotted keys).

use std::collections::HashMap;
use std::path::Path;

use crate::error::{TypeError, TypeResult};

/// Opaque key → string configuration lookup.
pub trait ConfigProvider: Send + Sync {
    /// Look up a configuration value by key.
    fn get(&self, key: &str) -> Option<String>;

    /// Look up a value, falling back to `default` when the key is absent.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// In-memory configuration backed by a `HashMap`.
#[derive(Clone, Debug, Default)]
pub struct MapConfig {
    entries: HashMap<String, String>,
}

impl MapConfig {
    /// Create an empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key, builder-style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.entries.insert(key.into(), value.into());
        self
    }

    /// Insert or replace a key.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Number of configured keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no keys are configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigProvider for MapConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Configuration loaded from a TOML file.
///
/// Nested tables are flattened into dotted keys, so
/// `[creator] agent = "x"` is looked up as `creator.agent`. Scalar values
/// are stringified; arrays of scalars are joined with commas.
#[derive(Clone, Debug)]
pub struct TomlConfig {
    entries: HashMap<String, String>,
}

impl TomlConfig {
    /// Load and flatten a TOML configuration file.
    ///
    /// A missing or unparsable file is a fatal configuration error.
    pub fn load(path: &Path) -> TypeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Parse a TOML document from a string.
    pub fn parse(text: &str) -> TypeResult<Self> {
        let value: toml::Value = text
            .parse()
            .map_err(|e: toml::de::Error| TypeError::InvalidConfig(e.to_string()))?;
        let mut entries = HashMap::new();
        flatten("", &value, &mut entries);
        Ok(Self { entries })
    }

    /// Number of flattened keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the document contained no values.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConfigProvider for TomlConfig {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

fn flatten(prefix: &str, value: &toml::Value, out: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let full = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}.{key}")
                };
                flatten(&full, val, out);
            }
        }
        toml::Value::Array(items) => {
            let joined: Vec<String> = items.iter().map(scalar_to_string).collect();
            out.insert(prefix.to_string(), joined.join(","));
        }
        other => {
            out.insert(prefix.to_string(), scalar_to_string(other));
        }
    }
}

fn scalar_to_string(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Replace `${key}` placeholders in `template` with values from `config`.
///
/// Unknown keys are left in place so the omission is visible in the
/// produced metadata rather than silently blanked.
pub fn expand_placeholders(template: &str, config: &dyn ConfigProvider) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match config.get(key) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push_str("${");
                        out.push_str(key);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            None => {
                // Unterminated placeholder; emit verbatim.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}
