//! Error types for espkeys-core

use thiserror::Error;

/// Result type alias using espkeys-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for espkeys
///
/// The `Configuration`, `Input`, and `Persistence` variants are fatal and
/// abort the whole run. `Parse` and `Derivation` are recoverable at
/// per-device granularity: the device is skipped and the run continues.
///
/// Error messages must never contain master-secret material.
#[derive(Error, Debug)]
pub enum Error {
    /// Master secret unavailable or invalid
    #[error("Master secret configuration error: {message}")]
    Configuration { message: String },

    /// Scan root missing or contains no device configurations
    #[error("Input error: {message}")]
    Input { message: String },

    /// A device configuration document is malformed
    #[error("Failed to parse device config {path}: {message}")]
    Parse { path: String, message: String },

    /// Invalid mode or empty device name reaching the derivation step
    #[error("Derivation error: {message}")]
    Derivation { message: String },

    /// Secrets store cannot be loaded or written
    #[error("Secrets store error: {message}")]
    Persistence { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl Error {
    /// Create a master-secret configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an input error
    pub fn input(message: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
        }
    }

    /// Create a per-device parse error
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a derivation error
    pub fn derivation(message: impl Into<String>) -> Self {
        Self::Derivation {
            message: message.into(),
        }
    }

    /// Create a persistence error
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
        }
    }

    /// Whether this error aborts the whole run (as opposed to skipping one device)
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Parse { .. } | Self::Derivation { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_device_errors_are_recoverable() {
        assert!(!Error::parse("device.yaml", "bad indent").is_fatal());
        assert!(!Error::derivation("empty device name").is_fatal());
    }

    #[test]
    fn test_run_level_errors_are_fatal() {
        assert!(Error::configuration("no source").is_fatal());
        assert!(Error::input("no configs found").is_fatal());
        assert!(Error::persistence("store is not a mapping").is_fatal());
    }

    #[test]
    fn test_parse_error_names_the_file() {
        let err = Error::parse("devices/kitchen.yaml", "unexpected token");
        let msg = err.to_string();
        assert!(msg.contains("devices/kitchen.yaml"));
        assert!(msg.contains("unexpected token"));
    }
}
