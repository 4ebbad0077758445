//! Secret derivation and store merging for espkeys
//!
//! This crate implements the core of the tool:
//! - **Master secret resolution**: literal, file, or environment variable
//! - **Deterministic derivation**: HMAC-SHA256 with mode/device domain
//!   separation, base64 (api) or hex (ota) encoding
//! - **Device discovery**: sorted recursive scan of ESPHome YAML configs,
//!   with injectable `!secret` tag handling
//! - **Non-destructive merge**: derived entries are added to an existing
//!   secrets store without touching pre-existing keys, persisted atomically

pub mod derive;
pub mod device;
pub mod master;
pub mod pipeline;
pub mod scan;
pub mod store;

pub use derive::{derive as derive_secret, key_name, DIGEST_LEN};
pub use device::{device_record, load_device_doc, resolve_device_name, TagPolicy};
pub use master::{MasterSecret, MasterSecretProvider, MASTER_SECRET_ENV};
pub use pipeline::{generate, generate_with_tags, GenerateRequest};
pub use scan::{scan_devices, CONFIG_EXTENSIONS};
pub use store::SecretsStore;
