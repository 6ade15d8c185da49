use crate::header::{HeaderField, HeaderMetadata};
use crate::types::ScriptName;
use chrono::{DateTime, Local};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::time::SystemTime;
use thiserror::Error;

/// strftime format of `last_modified`, e.g. `Jan 05 2024, 03:22:10PM`.
pub const LAST_MODIFIED_FORMAT: &str = "%b %d %Y, %I:%M:%S%p";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to serialize manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid manifest index '{0}', expected a positive integer")]
    InvalidIndex(String),
    #[error("manifest indices are not contiguous: expected {expected}, found {found}")]
    IndexGap { expected: usize, found: usize },
}

/// Format a filesystem timestamp in local time using [`LAST_MODIFIED_FORMAT`].
pub fn format_timestamp(time: SystemTime) -> String {
    DateTime::<Local>::from(time)
        .format(LAST_MODIFIED_FORMAT)
        .to_string()
}

/// URL prefixes used to derive a record's location fields from a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locations {
    pub script_prefix: String,
    pub signature_prefix: String,
    /// Signature file extension without the dot (`sha256`).
    pub signature_extension: String,
}

impl Locations {
    pub fn script_location(&self, name: &ScriptName) -> String {
        format!("{}{name}", self.script_prefix)
    }

    pub fn signature_location(&self, name: &ScriptName) -> String {
        format!(
            "{}{name}.{}",
            self.signature_prefix, self.signature_extension
        )
    }
}

/// One published script. Holds exactly the persisted fields.
///
/// Field order is the serialized order: header fields first, then the
/// derived location and timestamp fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestRecord {
    #[serde(rename = "Author", default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(rename = "Description", default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "Title", default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "Verified", default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<String>,
    #[serde(rename = "Version", default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub last_modified: String,
    pub script_location: String,
    pub signature_location: String,
}

impl ManifestRecord {
    pub fn build(
        name: &ScriptName,
        metadata: &HeaderMetadata,
        locations: &Locations,
        last_modified: String,
    ) -> Self {
        let field = |f: HeaderField| metadata.get(f).map(str::to_owned);
        Self {
            author: field(HeaderField::Author),
            description: field(HeaderField::Description),
            title: field(HeaderField::Title),
            verified: field(HeaderField::Verified),
            version: field(HeaderField::Version),
            last_modified,
            script_location: locations.script_location(name),
            signature_location: locations.signature_location(name),
        }
    }

    pub fn header(&self, field: HeaderField) -> Option<&str> {
        match field {
            HeaderField::Author => self.author.as_deref(),
            HeaderField::Description => self.description.as_deref(),
            HeaderField::Title => self.title.as_deref(),
            HeaderField::Verified => self.verified.as_deref(),
            HeaderField::Version => self.version.as_deref(),
        }
    }
}

/// Ordered collection of records, serialized as a mapping keyed `"1"`, `"2"`, ...
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    records: Vec<ManifestRecord>,
}

impl Manifest {
    pub fn new(records: Vec<ManifestRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ManifestRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by its 1-based manifest key.
    pub fn get(&self, index: usize) -> Option<&ManifestRecord> {
        index.checked_sub(1).and_then(|i| self.records.get(i))
    }

    /// Block-style YAML, one key per line.
    pub fn to_yaml(&self) -> Result<String, ManifestError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn from_yaml(input: &str) -> Result<Self, ManifestError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: BTreeMap<String, ManifestRecord> = serde_yaml::from_str(input)?;
        let mut indexed = Vec::with_capacity(raw.len());
        for (key, record) in raw {
            let index = key
                .parse::<usize>()
                .ok()
                .filter(|i| *i > 0)
                .ok_or_else(|| ManifestError::InvalidIndex(key.clone()))?;
            indexed.push((index, record));
        }
        indexed.sort_by_key(|(i, _)| *i);
        for (pos, (index, _)) in indexed.iter().enumerate() {
            if *index != pos + 1 {
                return Err(ManifestError::IndexGap {
                    expected: pos + 1,
                    found: *index,
                });
            }
        }
        Ok(Self::new(indexed.into_iter().map(|(_, r)| r).collect()))
    }
}

impl Serialize for Manifest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.records.len()))?;
        for (i, record) in self.records.iter().enumerate() {
            map.serialize_entry(&(i + 1).to_string(), record)?;
        }
        map.end()
    }
}
