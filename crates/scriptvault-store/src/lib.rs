//! Script directories, promotion, signatures, and integrity checks for scriptvault.
//!
//! This crate provides the storage layer: `PublishLayout` for the staging,
//! validated, and signature directories, `promote` for one-way idempotent
//! promotion, streaming SHA-256 digests, a `SignatureStore` of
//! `<script>.sha256` files written atomically, and `verify_signatures` for
//! checking published signatures against script content.

pub mod digest;
pub mod integrity;
pub mod layout;
pub mod promote;
pub mod signatures;

pub use digest::{compute_digest, digest_reader, CHUNK_SIZE};
pub use integrity::{verify_signatures, IntegrityFailure, IntegrityReport};
pub use layout::{PublishLayout, SIGNATURES_DIR, STAGING_DIR, VALIDATED_DIR};
pub use promote::{promote, PromotionFailure, PromotionReport};
pub use signatures::{SignatureStore, SHA256_EXTENSION};

use scriptvault_schema::ScriptName;
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("signature not found for script: {0}")]
    SignatureNotFound(String),
    #[error("malformed signature for script '{name}': {content:?}")]
    MalformedSignature { name: String, content: String },
}

/// Fsync a directory to ensure that a preceding `rename()` is durable.
///
/// POSIX does not guarantee a rename survives a crash until the parent
/// directory itself has been synced.
pub(crate) fn fsync_dir(dir: &Path) -> Result<(), std::io::Error> {
    let f = fs::File::open(dir)?;
    f.sync_all()
}

/// Mode of newly published files. Signatures and manifests are served to
/// readers other than the owner.
#[cfg(unix)]
pub const PUBLISHED_MODE: u32 = 0o644;

/// Prefix of the temp files `tempfile` creates next to their final path.
pub(crate) const TEMP_PREFIX: &str = ".tmp";

/// Replace `path` with `data` so that readers see either the old or the new
/// content, never a partial write.
///
/// A replaced file keeps its permissions; a new file gets [`PUBLISHED_MODE`].
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    set_published_permissions(tmp.as_file(), path)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    fsync_dir(dir)?;
    Ok(())
}

#[cfg(unix)]
fn set_published_permissions(file: &fs::File, target: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let permissions = match fs::metadata(target) {
        Ok(meta) => meta.permissions(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::Permissions::from_mode(PUBLISHED_MODE)
        }
        Err(e) => return Err(e),
    };
    file.set_permissions(permissions)
}

#[cfg(not(unix))]
fn set_published_permissions(_file: &fs::File, _target: &Path) -> io::Result<()> {
    Ok(())
}

/// List the scripts in `dir`, sorted by name.
///
/// Only regular files count. Leftover temp files from an interrupted write
/// and names that are not valid UTF-8 are skipped. A missing directory lists
/// as empty.
pub fn list_scripts(dir: &Path) -> Result<Vec<ScriptName>, StoreError> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            warn!(
                "skipping non UTF-8 file name in {}: {:?}",
                dir.display(),
                entry.file_name()
            );
            continue;
        };
        if name.starts_with(TEMP_PREFIX) {
            continue;
        }
        // Follows symlinks; dangling links are skipped.
        if !fs::metadata(entry.path()).is_ok_and(|m| m.is_file()) {
            continue;
        }
        names.push(ScriptName::new(name));
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display_signature_not_found() {
        let e = StoreError::SignatureNotFound("demo.py".to_owned());
        assert!(e.to_string().contains("demo.py"));
    }

    #[test]
    fn store_error_display_malformed_signature() {
        let e = StoreError::MalformedSignature {
            name: "a.sh".to_owned(),
            content: "zz".to_owned(),
        };
        let msg = e.to_string();
        assert!(msg.contains("a.sh"));
        assert!(msg.contains("zz"));
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yml");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn write_atomic_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        write_atomic(&dir.path().join("out.yml"), b"data").unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn write_atomic_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.yml");
        write_atomic(&path, b"x").unwrap();
        assert!(path.is_file());
    }

    #[test]
    fn list_scripts_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.sh"), b"b").unwrap();
        fs::write(dir.path().join("a.py"), b"a").unwrap();
        fs::write(dir.path().join(".tmpX1y2"), b"partial").unwrap();
        fs::create_dir(dir.path().join("subdir")).unwrap();

        let names = list_scripts(dir.path()).unwrap();
        assert_eq!(names, vec![ScriptName::new("a.py"), ScriptName::new("b.sh")]);
    }

    #[test]
    fn list_scripts_keeps_dotfile_scripts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(".profile.sh"), b"p").unwrap();
        fs::write(dir.path().join("a.sh"), b"a").unwrap();

        let names = list_scripts(dir.path()).unwrap();
        assert_eq!(
            names,
            vec![ScriptName::new(".profile.sh"), ScriptName::new("a.sh")]
        );
    }

    #[cfg(unix)]
    fn mode(path: &Path) -> u32 {
        use std::os::unix::fs::PermissionsExt;
        fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_new_file_is_world_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yml");
        write_atomic(&path, b"data").unwrap();
        assert_eq!(mode(&path), PUBLISHED_MODE);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_keeps_mode_of_replaced_file() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.yml");
        fs::write(&path, b"old").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o640)).unwrap();

        write_atomic(&path, b"new").unwrap();
        assert_eq!(mode(&path), 0o640);
        assert_eq!(fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn list_scripts_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_scripts(&dir.path().join("absent")).unwrap().is_empty());
    }
}
