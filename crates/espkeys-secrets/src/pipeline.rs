//! The full generate run
//!
//! State machine: LoadStore -> ResolveDevices -> DeriveSecrets -> Merge ->
//! {Persist | Emit}. Master-secret and store-load failures are fatal;
//! per-device parse/derivation failures are collected as warnings and the
//! run still merges and persists the entries that succeeded.

use crate::derive;
use crate::device::{self, TagPolicy};
use crate::master::{MasterSecret, MasterSecretProvider};
use crate::scan;
use crate::store::SecretsStore;
use espkeys_core::{DeviceFailure, DeviceRecord, Mode, Result, RunReport};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Inputs for one generate run
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    /// Scan root containing device configurations
    pub root: PathBuf,
    /// Derivation mode for this run
    pub mode: Mode,
    /// Literal master secret (highest precedence)
    pub master_secret: Option<String>,
    /// File containing the master secret
    pub master_secret_file: Option<PathBuf>,
    /// Secrets store to create/update; also used for skip detection in
    /// emit mode. `None` runs detached from any store.
    pub output: Option<PathBuf>,
    /// Emit computed entries instead of persisting the store
    pub print_only: bool,
}

/// Run the full pipeline with the standard ESPHome tag policy
pub async fn generate(request: &GenerateRequest) -> Result<RunReport> {
    generate_with_tags(request, &TagPolicy::default()).await
}

/// Run the full pipeline with an explicit tag policy
pub async fn generate_with_tags(
    request: &GenerateRequest,
    tags: &TagPolicy,
) -> Result<RunReport> {
    // Fatal: no master secret means nothing can be derived
    let provider = MasterSecretProvider::new(
        request.master_secret.clone(),
        request.master_secret_file.clone(),
    );
    let master = provider.resolve().await?;

    // Fatal: an unreadable store must not be silently replaced
    let mut store = match &request.output {
        Some(path) => SecretsStore::load(path).await?,
        None => SecretsStore::empty(),
    };

    // Fatal: a missing or empty scan root is a caller mistake
    let files = scan::scan_devices(&request.root)?;

    let mut report = RunReport {
        devices_found: files.len(),
        ..Default::default()
    };
    let mut computed: Vec<(String, String)> = Vec::new();
    let mut seen_names: HashSet<String> = HashSet::new();

    for path in &files {
        match process_device(path, request.mode, &master, tags).await {
            Ok((record, key, value)) => {
                if !seen_names.insert(record.name.clone()) {
                    // Same name would derive the same keys; keep the first
                    // occurrence and flag the rest instead of collapsing
                    // silently.
                    report.failures.push(DeviceFailure {
                        source: path.clone(),
                        reason: format!(
                            "duplicate device name '{}' (already seen earlier in this run)",
                            record.name
                        ),
                    });
                    continue;
                }

                debug!("Derived {} for device '{}'", key, record.name);
                computed.push((key, value));
                report.devices_processed += 1;
            }
            Err(e) if !e.is_fatal() => {
                warn!("Skipping {}: {}", path.display(), e);
                report.failures.push(DeviceFailure {
                    source: path.clone(),
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    let outcome = store.merge(&computed);

    if !request.print_only {
        if let Some(path) = &request.output {
            store.persist(path).await?;
        }
    }

    report.new_entries = computed
        .into_iter()
        .filter(|(key, _)| outcome.added.contains(key))
        .collect();
    report.outcome = outcome;

    Ok(report)
}

async fn process_device(
    path: &Path,
    mode: Mode,
    master: &MasterSecret,
    tags: &TagPolicy,
) -> Result<(DeviceRecord, String, String)> {
    let doc = device::load_device_doc(path).await?;
    let record = device::device_record(&doc, path, tags)?;
    let value = derive::derive(master, mode, &record.name)?;
    let key = derive::key_name(mode, &record.name);
    Ok((record, key, value))
}
