//! Header metadata, manifest records, and settings for scriptvault.
//!
//! This crate defines the schema layer: comment-header extraction
//! (`HeaderMetadata`), the typed per-script `ManifestRecord` and the ordered
//! `Manifest` with its YAML form, and the `Settings` loaded from
//! `settings.yaml`. Nothing here touches the script directories.

pub mod header;
pub mod manifest;
pub mod settings;
pub mod types;

pub use header::{extract, extract_from_reader, HeaderField, HeaderMetadata};
pub use manifest::{
    format_timestamp, Locations, Manifest, ManifestError, ManifestRecord, LAST_MODIFIED_FORMAT,
};
pub use settings::{Settings, SettingsError, DEFAULT_MANIFEST_FILE, SETTINGS_FILE};
pub use types::{Digest, ScriptName};
