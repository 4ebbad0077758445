//! The persisted secrets store
//!
//! A flat YAML mapping from secret key names to values. Merging only ever
//! adds keys absent from the loaded store; pre-existing keys keep their
//! parsed value and relative order through re-serialization (the backing
//! `Mapping` is insertion-ordered). Comments and blank lines in a
//! hand-edited store are not preserved.
//!
//! Persistence is atomic: the store is written to a sibling `.tmp` file and
//! renamed into place, so a crash mid-write never corrupts the previous
//! store.

use espkeys_core::{Error, MergeOutcome, Result};
use serde_yaml_ng::{Mapping, Value};
use std::path::Path;
use tracing::{debug, info};

/// In-memory secrets store, loaded once per run
#[derive(Debug, Clone, Default)]
pub struct SecretsStore {
    entries: Mapping,
}

impl SecretsStore {
    /// An empty store (no persisted resource, or detached emit mode)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the store from disk; an absent file yields an empty store
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("Secrets store {} does not exist yet, starting empty", path.display());
            return Ok(Self::empty());
        }

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            Error::persistence(format!("failed to read {}: {}", path.display(), e))
        })?;

        if content.trim().is_empty() {
            return Ok(Self::empty());
        }

        let value: Value = serde_yaml_ng::from_str(&content).map_err(|e| {
            Error::persistence(format!("failed to parse {}: {}", path.display(), e))
        })?;

        match value {
            Value::Null => Ok(Self::empty()),
            Value::Mapping(entries) => Ok(Self { entries }),
            _ => Err(Error::persistence(format!(
                "{} is not a key-value mapping",
                path.display()
            ))),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(&Value::String(key.to_string()))
    }

    /// The value for a key, if present and a string scalar
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.entries
            .get(&Value::String(key.to_string()))
            .and_then(Value::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys in store order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().filter_map(Value::as_str)
    }

    /// Merge computed entries into the store
    ///
    /// Keys already present are left untouched and recorded as skipped;
    /// that is not an error, it preserves manually rotated or externally
    /// managed secrets. New keys append in entry order.
    pub fn merge(&mut self, computed: &[(String, String)]) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        for (key, value) in computed {
            if self.contains(key) {
                debug!("Skipping existing key '{}'", key);
                outcome.skipped.push(key.clone());
            } else {
                self.entries.insert(
                    Value::String(key.clone()),
                    Value::String(value.clone()),
                );
                outcome.added.push(key.clone());
            }
        }

        outcome
    }

    /// Render the store as a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml_ng::to_string(&self.entries).map_err(Error::from)
    }

    /// Atomically write the store to disk
    pub async fn persist(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(|e| {
                    Error::persistence(format!(
                        "failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let rendered = self.to_yaml()?;

        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                Error::persistence(format!("invalid store path: {}", path.display()))
            })?;
        let temp_path = path.with_file_name(format!("{}.tmp", file_name));

        tokio::fs::write(&temp_path, rendered).await.map_err(|e| {
            Error::persistence(format!("failed to write {}: {}", temp_path.display(), e))
        })?;

        tokio::fs::rename(&temp_path, path).await.map_err(|e| {
            Error::persistence(format!(
                "failed to move {} into place: {}",
                temp_path.display(),
                e
            ))
        })?;

        info!("Persisted {} entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_merge_adds_absent_keys() {
        let mut store = SecretsStore::empty();
        let outcome = store.merge(&entries(&[("api_a", "v1"), ("api_b", "v2")]));

        assert_eq!(outcome.added, vec!["api_a", "api_b"]);
        assert!(outcome.skipped.is_empty());
        assert_eq!(store.get_str("api_a"), Some("v1"));
    }

    #[test]
    fn test_merge_never_overwrites() {
        let mut store = SecretsStore::empty();
        store.merge(&entries(&[("api_a", "original")]));

        let outcome = store.merge(&entries(&[("api_a", "rotated"), ("api_b", "new")]));

        assert_eq!(outcome.added, vec!["api_b"]);
        assert_eq!(outcome.skipped, vec!["api_a"]);
        assert_eq!(store.get_str("api_a"), Some("original"));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let computed = entries(&[("ota_a", "v1"), ("ota_b", "v2")]);

        let mut store = SecretsStore::empty();
        store.merge(&computed);
        let first = store.to_yaml().unwrap();

        let outcome = store.merge(&computed);
        let second = store.to_yaml().unwrap();

        assert!(outcome.added.is_empty());
        assert_eq!(outcome.skipped.len(), 2);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_unrelated_keys_keep_value_and_order() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.yaml");
        std::fs::write(
            &path,
            "wifi_password: hunter2\napi_old_device: keepme\nmqtt_port: 1883\n",
        )
        .unwrap();

        let mut store = SecretsStore::load(&path).await.unwrap();
        store.merge(&entries(&[("api_new_device", "derived")]));
        store.persist(&path).await.unwrap();

        let reloaded = SecretsStore::load(&path).await.unwrap();
        let keys: Vec<_> = reloaded.keys().collect();
        assert_eq!(
            keys,
            vec!["wifi_password", "api_old_device", "mqtt_port", "api_new_device"]
        );
        assert_eq!(reloaded.get_str("wifi_password"), Some("hunter2"));

        // Non-string scalar survives the round trip
        let rendered = std::fs::read_to_string(&path).unwrap();
        assert!(rendered.contains("mqtt_port: 1883"));
    }

    #[tokio::test]
    async fn test_load_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = SecretsStore::load(&temp_dir.path().join("absent.yaml"))
            .await
            .unwrap();
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_load_non_mapping_is_persistence_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secrets.yaml");
        std::fs::write(&path, "- just\n- a\n- list\n").unwrap();

        let err = SecretsStore::load(&path).await.unwrap_err();
        assert!(matches!(err, Error::Persistence { .. }));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_persist_creates_parent_and_leaves_no_temp() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("deep/nested/secrets.yaml");

        let mut store = SecretsStore::empty();
        store.merge(&entries(&[("api_a", "v1")]));
        store.persist(&path).await.unwrap();

        assert!(path.exists());
        assert!(!path.with_file_name("secrets.yaml.tmp").exists());

        let reloaded = SecretsStore::load(&path).await.unwrap();
        assert_eq!(reloaded.get_str("api_a"), Some("v1"));
    }
}
