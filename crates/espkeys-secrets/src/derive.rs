//! Deterministic key derivation
//!
//! Derived values are `HMAC-SHA256(key = master secret, message =
//! "{mode}:{device_name}")`. The mode is part of the hashed message, so the
//! API key and OTA password for the same device are cryptographically
//! unrelated even though both come from the same master secret.
//!
//! The hash algorithm, message layout, and encodings are versioned
//! constants: regenerating from the same master secret must reproduce
//! byte-identical values, since recoverability after loss of the secrets
//! store is the whole point.

use crate::master::MasterSecret;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use espkeys_core::{Error, Mode, Result};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Full HMAC-SHA256 output length; no truncation is applied
pub const DIGEST_LEN: usize = 32;

/// Separator between mode and device name in the hashed message
const DOMAIN_SEPARATOR: &[u8] = b":";

/// The secret key name for a (mode, device) pair, e.g. `api_switch_living`
pub fn key_name(mode: Mode, device_name: &str) -> String {
    format!("{}_{}", mode, device_name)
}

/// Derive the secret value for a (mode, device) pair
///
/// Api mode encodes the 32-byte digest as standard padded base64 (the
/// ESPHome API encryption pre-shared-key format, 44 characters); Ota mode
/// encodes it as 64 lowercase hex characters (a copy-pasteable password).
pub fn derive(master: &MasterSecret, mode: Mode, device_name: &str) -> Result<String> {
    if device_name.trim().is_empty() {
        return Err(Error::derivation("device name is empty"));
    }

    let mut mac = HmacSha256::new_from_slice(master.expose())
        .expect("HMAC-SHA256 accepts keys of any length");
    mac.update(mode.as_str().as_bytes());
    mac.update(DOMAIN_SEPARATOR);
    mac.update(device_name.as_bytes());
    let digest = mac.finalize().into_bytes();

    Ok(match mode {
        Mode::Api => STANDARD.encode(digest),
        Mode::Ota => hex::encode(digest),
    })
}
