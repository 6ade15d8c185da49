use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default settings file name, resolved against the base directory.
pub const SETTINGS_FILE: &str = "settings.yaml";
/// Default manifest file name, resolved against the base directory.
pub const DEFAULT_MANIFEST_FILE: &str = "resources.yml";
const DEFAULT_KEY_NAME: &str = "my_gpg_key";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("settings key '{0}' is required")]
    MissingKey(&'static str),
}

/// Flat key-value file as written by users. Prefixes stay optional here so
/// that a missing one can be reported by name.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    script_location_prefix: Option<String>,
    signature_location_prefix: Option<String>,
    key_name: Option<String>,
    force_overwrite: Option<bool>,
    manifest_path: Option<PathBuf>,
}

/// Publishing settings, loaded once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Settings {
    pub script_location_prefix: String,
    pub signature_location_prefix: String,
    /// Signing-key identifier of the legacy GPG flow. Not used by the pipeline.
    pub key_name: String,
    /// Key-regeneration switch of the legacy GPG flow. Not used by the pipeline.
    pub force_overwrite: bool,
    /// Manifest output path; relative paths resolve against the base directory.
    pub manifest_path: PathBuf,
}

impl Settings {
    pub fn new(script_location_prefix: &str, signature_location_prefix: &str) -> Self {
        Self {
            script_location_prefix: script_location_prefix.to_owned(),
            signature_location_prefix: signature_location_prefix.to_owned(),
            key_name: DEFAULT_KEY_NAME.to_owned(),
            force_overwrite: false,
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_FILE),
        }
    }

    #[must_use]
    pub fn with_manifest_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.manifest_path = path.into();
        self
    }

    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, SettingsError> {
        let raw: RawSettings = if input.trim().is_empty() {
            RawSettings::default()
        } else {
            serde_yaml::from_str(input)?
        };

        let script_location_prefix = raw
            .script_location_prefix
            .ok_or(SettingsError::MissingKey("script_location_prefix"))?;
        let signature_location_prefix = raw
            .signature_location_prefix
            .ok_or(SettingsError::MissingKey("signature_location_prefix"))?;

        Ok(Self {
            script_location_prefix,
            signature_location_prefix,
            key_name: raw.key_name.unwrap_or_else(|| DEFAULT_KEY_NAME.to_owned()),
            force_overwrite: raw.force_overwrite.unwrap_or(false),
            manifest_path: raw
                .manifest_path
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MANIFEST_FILE)),
        })
    }

    /// Manifest path resolved against `base`.
    pub fn manifest_path_in(&self, base: &Path) -> PathBuf {
        base.join(&self.manifest_path)
    }
}
