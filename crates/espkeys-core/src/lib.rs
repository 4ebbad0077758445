//! # espkeys-core
//!
//! Core library for the espkeys CLI providing:
//! - The error taxonomy shared across crates
//! - Type definitions for derivation modes, device records, and run reports

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{DeviceFailure, DeviceRecord, MergeOutcome, Mode, RunReport};
