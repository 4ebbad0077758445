//! Shared types for espkeys

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Derivation mode, used for domain separation
///
/// The mode string is hashed into the derivation message and prefixes the
/// secret key name, so the API key and OTA password for the same device are
/// cryptographically unrelated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// ESPHome API encryption key (base64-encoded 32-byte PSK)
    Api,
    /// ESPHome OTA password (64-char lowercase hex)
    Ota,
}

impl Mode {
    /// Stable wire name, used in the hashed message and the key-name prefix
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Api => "api",
            Mode::Ota => "ota",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "api" => Ok(Mode::Api),
            "ota" => Ok(Mode::Ota),
            other => Err(Error::derivation(format!(
                "unknown mode '{}' (expected 'api' or 'ota')",
                other
            ))),
        }
    }
}

/// A discovered device configuration with its resolved name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// Canonical device name, used verbatim in key naming
    pub name: String,
    /// Configuration file the record came from
    pub source: PathBuf,
}

impl DeviceRecord {
    pub fn new(name: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// A recoverable per-device failure, collected for the end-of-run summary
#[derive(Debug, Clone)]
pub struct DeviceFailure {
    /// Configuration file that failed
    pub source: PathBuf,
    /// Human-readable reason (never contains secret material)
    pub reason: String,
}

impl fmt::Display for DeviceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source.display(), self.reason)
    }
}

/// Outcome of merging computed entries into the secrets store
#[derive(Debug, Clone, Default, Serialize)]
pub struct MergeOutcome {
    /// Keys added to the store by this run
    pub added: Vec<String>,
    /// Keys that already existed and were left untouched
    pub skipped: Vec<String>,
}

/// Summary of a full generate run
#[derive(Debug, Default)]
pub struct RunReport {
    /// Device configurations discovered under the scan root
    pub devices_found: usize,
    /// Devices that resolved and derived successfully
    pub devices_processed: usize,
    /// Merge result for the successful devices
    pub outcome: MergeOutcome,
    /// (key, value) pairs added by this run, in scan order (for emit mode)
    pub new_entries: Vec<(String, String)>,
    /// Per-device failures (the run still completed for the rest)
    pub failures: Vec<DeviceFailure>,
}

impl RunReport {
    /// Whether every discovered device was processed without failure
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_roundtrip() {
        assert_eq!("api".parse::<Mode>().unwrap(), Mode::Api);
        assert_eq!("ota".parse::<Mode>().unwrap(), Mode::Ota);
        assert_eq!(Mode::Api.to_string(), "api");
        assert_eq!(Mode::Ota.to_string(), "ota");
    }

    #[test]
    fn test_mode_rejects_unknown() {
        let err = "psk".parse::<Mode>().unwrap_err();
        assert!(err.to_string().contains("unknown mode 'psk'"));
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_mode_rejects_case_variants() {
        // Mode strings are versioned constants; no case-folding
        assert!("API".parse::<Mode>().is_err());
        assert!("Ota".parse::<Mode>().is_err());
    }
}
