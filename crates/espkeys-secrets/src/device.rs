//! Device configuration documents and name resolution
//!
//! ESPHome configs are YAML documents that may carry `!secret` tags marking
//! a scalar as a reference to a named secret (e.g. `!secret ota_pass`). Tag
//! handling is an explicit, injectable [`TagPolicy`] passed into scalar
//! extraction rather than a global parser registry, so documents with tags
//! parse cleanly in any context.
//!
//! Device name precedence, first non-empty trimmed scalar wins:
//! 1. `substitutions.name`
//! 2. `substitutions.device_name`
//! 3. `esphome.name`
//! 4. the config file stem
//!
//! The resolved name is used verbatim in key naming; no case-folding or
//! character substitution is applied.

use espkeys_core::{DeviceRecord, Error, Result};
use serde_yaml_ng::Value;
use std::collections::HashMap;
use std::path::Path;

/// Extracts the scalar string carried by a tagged node
pub type TagHandler = fn(&Value) -> Option<String>;

/// Mapping from tag name (without the leading `!`) to extraction function
#[derive(Clone)]
pub struct TagPolicy {
    handlers: HashMap<String, TagHandler>,
}

impl TagPolicy {
    /// A policy that resolves no tags
    pub fn empty() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// The standard ESPHome policy: `!secret name` yields `"name"`
    pub fn esphome() -> Self {
        Self::empty().with_handler("secret", scalar_to_string)
    }

    /// Register a handler for a tag name
    pub fn with_handler(mut self, tag: impl Into<String>, handler: TagHandler) -> Self {
        self.handlers.insert(tag.into(), handler);
        self
    }

    /// Extract a scalar string from a value, resolving tagged nodes
    ///
    /// Returns `None` for mappings, sequences, nulls, and tags without a
    /// registered handler.
    pub fn scalar_str(&self, value: &Value) -> Option<String> {
        match value {
            Value::Tagged(tagged) => {
                let tag = tagged.tag.to_string();
                let name = tag.trim_start_matches('!');
                self.handlers.get(name).and_then(|h| h(&tagged.value))
            }
            other => scalar_to_string(other),
        }
    }
}

impl Default for TagPolicy {
    fn default() -> Self {
        Self::esphome()
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Load a device configuration document from disk
///
/// Malformed YAML is a recoverable per-device `Parse` error.
pub async fn load_device_doc(path: &Path) -> Result<Value> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::parse(path.display().to_string(), e.to_string()))?;

    // An empty document is a valid (nameless) config
    if content.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_yaml_ng::from_str(&content)
        .map_err(|e| Error::parse(path.display().to_string(), e.to_string()))
}

/// Resolve the canonical device name for a parsed document
///
/// The fallback is always available, so resolution itself never fails.
pub fn resolve_device_name(doc: &Value, fallback: &str, tags: &TagPolicy) -> String {
    const PRECEDENCE: &[(&str, &str)] = &[
        ("substitutions", "name"),
        ("substitutions", "device_name"),
        ("esphome", "name"),
    ];

    for (section, key) in PRECEDENCE {
        let candidate = doc
            .get(section)
            .and_then(|s| s.get(key))
            .and_then(|v| tags.scalar_str(v));

        if let Some(candidate) = candidate {
            let trimmed = candidate.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    fallback.trim().to_string()
}

/// Build the device record for a config file
///
/// An empty document resolves to the file stem; a document whose root is a
/// scalar or sequence is not a device config and is a `Parse` error.
pub fn device_record(doc: &Value, path: &Path, tags: &TagPolicy) -> Result<DeviceRecord> {
    match doc {
        Value::Mapping(_) | Value::Null => {}
        _ => {
            return Err(Error::parse(
                path.display().to_string(),
                "document root is not a mapping",
            ));
        }
    }

    let fallback = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    let name = resolve_device_name(doc, fallback, tags);
    Ok(DeviceRecord::new(name, path))
}
