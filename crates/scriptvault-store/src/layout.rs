use crate::StoreError;
use scriptvault_schema::ScriptName;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const STAGING_DIR: &str = "scripts";
pub const VALIDATED_DIR: &str = "validated_scripts";
pub const SIGNATURES_DIR: &str = "sha_signatures";

/// Directory layout of a script catalog rooted at a base directory.
///
/// Manages paths for the staging, validated, and signature directories.
/// All of them are created on [`initialize`](Self::initialize).
#[derive(Debug, Clone)]
pub struct PublishLayout {
    root: PathBuf,
}

impl PublishLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Newly contributed scripts awaiting promotion.
    #[inline]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Authoritative scripts included in the published manifest.
    #[inline]
    pub fn validated_dir(&self) -> PathBuf {
        self.root.join(VALIDATED_DIR)
    }

    #[inline]
    pub fn signatures_dir(&self) -> PathBuf {
        self.root.join(SIGNATURES_DIR)
    }

    #[inline]
    pub fn validated_script(&self, name: &ScriptName) -> PathBuf {
        self.validated_dir().join(name)
    }

    /// Create any missing directory. Existing content is left alone.
    pub fn initialize(&self) -> Result<(), StoreError> {
        for dir in [
            self.signatures_dir(),
            self.validated_dir(),
            self.staging_dir(),
        ] {
            if !dir.is_dir() {
                debug!("creating missing directory {}", dir.display());
                fs::create_dir_all(&dir)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_paths_are_correct() {
        let layout = PublishLayout::new("/tmp/catalog");
        assert_eq!(layout.staging_dir(), PathBuf::from("/tmp/catalog/scripts"));
        assert_eq!(
            layout.validated_dir(),
            PathBuf::from("/tmp/catalog/validated_scripts")
        );
        assert_eq!(
            layout.signatures_dir(),
            PathBuf::from("/tmp/catalog/sha_signatures")
        );
        assert_eq!(
            layout.validated_script(&ScriptName::new("demo.py")),
            PathBuf::from("/tmp/catalog/validated_scripts/demo.py")
        );
    }

    #[test]
    fn initialize_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let layout = PublishLayout::new(dir.path());
        layout.initialize().unwrap();

        assert!(layout.staging_dir().is_dir());
        assert!(layout.validated_dir().is_dir());
        assert!(layout.signatures_dir().is_dir());
    }

    #[test]
    fn initialize_is_idempotent_and_keeps_content() {
        let dir = tempfile::tempdir().unwrap();
        let layout = PublishLayout::new(dir.path());
        layout.initialize().unwrap();
        fs::write(layout.staging_dir().join("a.sh"), b"echo a").unwrap();
        layout.initialize().unwrap();
        assert_eq!(
            fs::read(layout.staging_dir().join("a.sh")).unwrap(),
            b"echo a"
        );
    }

    #[test]
    fn initialize_fails_when_path_is_a_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(SIGNATURES_DIR), b"not a dir").unwrap();
        let layout = PublishLayout::new(dir.path());
        assert!(layout.initialize().is_err());
    }
}
