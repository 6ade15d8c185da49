//! Publishing pipeline for scriptvault.
//!
//! This crate ties the schema and store layers together into `Pipeline`: a
//! single sequential pass that promotes staging scripts, signs every
//! validated script, extracts its header metadata, and atomically rewrites
//! the manifest. Signing goes through the `Signer` trait; `Sha256Signer`
//! is the content-integrity implementation used in production.

pub mod pipeline;
pub mod signer;

pub use pipeline::{read_manifest, write_manifest, BuildReport, Pipeline, SkippedScript};
pub use signer::{Passphrase, Sha256Signer, Signer};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("settings error: {0}")]
    Settings(#[from] scriptvault_schema::SettingsError),
    #[error("manifest error: {0}")]
    Manifest(#[from] scriptvault_schema::ManifestError),
    #[error("store error: {0}")]
    Store(#[from] scriptvault_store::StoreError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
