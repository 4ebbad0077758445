//! Master secret resolution
//!
//! Precedence chain (highest to lowest):
//! 1. Explicit literal secret (CLI flag)
//! 2. File path (contents are the secret, surrounding whitespace trimmed)
//! 3. `ESPHOME_MASTER_SECRET` environment variable
//!
//! The resolved value is an opaque byte sequence; if the caller stores it
//! base64-encoded, decoding is the caller's convention and is not applied
//! here. The value is never written to any log or error message.

use espkeys_core::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::debug;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Environment variable consulted when no explicit source is configured
pub const MASTER_SECRET_ENV: &str = "ESPHOME_MASTER_SECRET";

/// The master secret, held in memory for the duration of one run
///
/// Bytes are zeroed on drop. The `Debug` impl redacts the value so the
/// secret cannot leak through log or error formatting.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterSecret(Vec<u8>);

impl MasterSecret {
    /// Wrap already-trimmed secret material
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::configuration("master secret is empty"));
        }
        Ok(Self(bytes))
    }

    /// The raw key material, for use as an HMAC key
    pub fn expose(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for MasterSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "MasterSecret([REDACTED {} bytes])", self.0.len())
    }
}

/// Resolves the master secret from one of the configured sources
pub struct MasterSecretProvider {
    literal: Option<String>,
    file: Option<PathBuf>,
    env_var: String,
}

impl MasterSecretProvider {
    pub fn new(literal: Option<String>, file: Option<PathBuf>) -> Self {
        Self {
            literal,
            file,
            env_var: MASTER_SECRET_ENV.to_string(),
        }
    }

    /// Override the environment variable name (for testing)
    pub fn with_env_var(mut self, var: impl Into<String>) -> Self {
        self.env_var = var.into();
        self
    }

    /// Resolve the master secret, walking the precedence chain
    pub async fn resolve(&self) -> Result<MasterSecret> {
        if let Some(literal) = &self.literal {
            debug!("Using master secret from command line");
            return Self::from_text(literal);
        }

        if let Some(path) = &self.file {
            debug!("Reading master secret from file");
            let content = Self::read_secret_file(path).await?;
            return Self::from_text(&content);
        }

        if let Ok(value) = std::env::var(&self.env_var) {
            debug!("Using master secret from {}", self.env_var);
            return Self::from_text(&value);
        }

        Err(Error::configuration(format!(
            "missing master secret: use --master-secret, --master-secret-file, or the {} environment variable",
            self.env_var
        )))
    }

    /// Read the secret file, expanding `~` and environment variables in the path
    async fn read_secret_file(path: &Path) -> Result<String> {
        let raw = path.to_str().ok_or_else(|| {
            Error::configuration(format!("master secret path is not valid UTF-8: {}", path.display()))
        })?;

        let expanded = shellexpand::full(raw)
            .map_err(|e| Error::configuration(format!("failed to expand path {}: {}", raw, e)))?;

        tokio::fs::read_to_string(expanded.as_ref())
            .await
            .map_err(|e| {
                Error::configuration(format!(
                    "failed to read master secret file {}: {}",
                    expanded, e
                ))
            })
    }

    fn from_text(text: &str) -> Result<MasterSecret> {
        MasterSecret::from_bytes(text.trim().as_bytes().to_vec())
    }
}
