use crate::layout::PublishLayout;
use crate::{write_atomic, StoreError};
use scriptvault_schema::{Digest, ScriptName};
use std::fs;
use std::io;
use std::path::PathBuf;

/// Extension of SHA-256 signature files.
pub const SHA256_EXTENSION: &str = "sha256";

/// Signature files stored as `<script-name>.<extension>` in the signature directory.
///
/// Each file holds the bare hex digest with no trailing newline. Writes are
/// atomic so a crashed run never leaves a truncated signature behind.
pub struct SignatureStore {
    dir: PathBuf,
    extension: String,
}

impl SignatureStore {
    pub fn new(layout: &PublishLayout, extension: &str) -> Self {
        Self {
            dir: layout.signatures_dir(),
            extension: extension.to_owned(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn path_for(&self, name: &ScriptName) -> PathBuf {
        self.dir.join(format!("{name}.{}", self.extension))
    }

    /// Write (or overwrite) the signature for `name` and return its path.
    pub fn put(&self, name: &ScriptName, digest: &Digest) -> Result<PathBuf, StoreError> {
        let path = self.path_for(name);
        write_atomic(&path, digest.as_bytes())?;
        Ok(path)
    }

    pub fn get(&self, name: &ScriptName) -> Result<Digest, StoreError> {
        let path = self.path_for(name);
        if !path.exists() {
            return Err(StoreError::SignatureNotFound(name.to_string()));
        }
        let content = fs::read_to_string(&path)?;
        let digest = Digest::new(content.trim_end());
        if digest.is_empty() {
            return Err(StoreError::MalformedSignature {
                name: name.to_string(),
                content,
            });
        }
        Ok(digest)
    }

    /// Delete the signature for `name`. A missing file is not an error.
    pub fn remove(&self, name: &ScriptName) -> Result<(), StoreError> {
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Names of the scripts that have a signature file, sorted.
    pub fn list(&self) -> Result<Vec<ScriptName>, StoreError> {
        let suffix = format!(".{}", self.extension);
        Ok(crate::list_scripts(&self.dir)?
            .into_iter()
            .filter_map(|file| file.strip_suffix(&suffix).map(ScriptName::from))
            .filter(|name| !name.is_empty())
            .collect())
    }
}
