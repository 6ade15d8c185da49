use crate::{fsync_dir, list_scripts, StoreError};
use scriptvault_schema::ScriptName;
use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// Outcome of one promotion pass.
#[derive(Debug, Default)]
pub struct PromotionReport {
    /// Scripts copied from staging in this pass.
    pub promoted: Vec<ScriptName>,
    /// Staging scripts whose validated copy already existed and was left alone.
    pub already_present: Vec<ScriptName>,
    pub failed: Vec<PromotionFailure>,
    /// The validated set after promotion.
    pub validated: BTreeSet<ScriptName>,
}

#[derive(Debug)]
pub struct PromotionFailure {
    pub name: ScriptName,
    pub reason: String,
}

/// Copy every staging script that has no validated counterpart yet.
///
/// An existing validated copy is authoritative and is never overwritten,
/// even if the staging file changed since. Nothing is ever deleted. Both
/// directories are created when absent. A script that fails to copy is
/// recorded in the report and the pass continues.
pub fn promote(staging: &Path, validated: &Path) -> Result<PromotionReport, StoreError> {
    fs::create_dir_all(staging)?;
    fs::create_dir_all(validated)?;

    let mut report = PromotionReport::default();
    for name in list_scripts(staging)? {
        let dest = validated.join(&name);
        if dest.exists() {
            debug!("{name} already validated, leaving it untouched");
            report.already_present.push(name);
            continue;
        }
        match copy_preserving_mtime(&staging.join(&name), validated, &dest) {
            Ok(true) => {
                info!("promoted {name}");
                report.promoted.push(name);
            }
            Ok(false) => {
                debug!("{name} appeared in validated during promotion");
                report.already_present.push(name);
            }
            Err(e) => {
                warn!("failed to promote {name}: {e}");
                report.failed.push(PromotionFailure {
                    name,
                    reason: e.to_string(),
                });
            }
        }
    }

    if !report.promoted.is_empty() {
        fsync_dir(validated)?;
    }
    report.validated = list_scripts(validated)?.into_iter().collect();
    Ok(report)
}

/// Copy `src` to `dest` through a temp file in `dir`, keeping mtime and
/// permissions. Returns `false` if `dest` already exists.
fn copy_preserving_mtime(src: &Path, dir: &Path, dest: &Path) -> Result<bool, StoreError> {
    let mut source = File::open(src)?;
    let meta = source.metadata()?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    io::copy(&mut source, &mut tmp)?;
    fs::set_permissions(tmp.path(), meta.permissions())?;
    tmp.as_file().set_modified(meta.modified()?)?;
    tmp.as_file().sync_all()?;

    match tmp.persist_noclobber(dest) {
        Ok(_) => Ok(true),
        Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(StoreError::Io(e.error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    struct Dirs {
        _root: tempfile::TempDir,
        staging: std::path::PathBuf,
        validated: std::path::PathBuf,
    }

    fn dirs() -> Dirs {
        let root = tempfile::tempdir().unwrap();
        let staging = root.path().join("scripts");
        let validated = root.path().join("validated_scripts");
        fs::create_dir_all(&staging).unwrap();
        Dirs {
            _root: root,
            staging,
            validated,
        }
    }

    fn snapshot(dir: &Path) -> Vec<(String, Vec<u8>)> {
        list_scripts(dir)
            .unwrap()
            .into_iter()
            .map(|n| (n.to_string(), fs::read(dir.join(&n)).unwrap()))
            .collect()
    }

    #[test]
    fn copies_new_scripts() {
        let d = dirs();
        fs::write(d.staging.join("a.sh"), b"echo a\n").unwrap();
        fs::write(d.staging.join("b.py"), b"print('b')\n").unwrap();

        let report = promote(&d.staging, &d.validated).unwrap();
        assert_eq!(report.promoted.len(), 2);
        assert!(report.failed.is_empty());
        assert_eq!(report.validated.len(), 2);
        assert_eq!(fs::read(d.validated.join("a.sh")).unwrap(), b"echo a\n");
    }

    #[test]
    fn promotion_is_idempotent() {
        let d = dirs();
        fs::write(d.staging.join("a.sh"), b"echo a\n").unwrap();
        fs::write(d.staging.join("b.sh"), b"echo b\n").unwrap();

        promote(&d.staging, &d.validated).unwrap();
        let first = snapshot(&d.validated);
        let report = promote(&d.staging, &d.validated).unwrap();

        assert!(report.promoted.is_empty());
        assert_eq!(report.already_present.len(), 2);
        assert_eq!(snapshot(&d.validated), first);
    }

    #[test]
    fn edited_staging_does_not_overwrite_validated() {
        let d = dirs();
        fs::write(d.staging.join("a.sh"), b"original\n").unwrap();
        promote(&d.staging, &d.validated).unwrap();

        fs::write(d.staging.join("a.sh"), b"edited later\n").unwrap();
        promote(&d.staging, &d.validated).unwrap();

        assert_eq!(fs::read(d.validated.join("a.sh")).unwrap(), b"original\n");
    }

    #[test]
    fn removed_staging_script_stays_validated() {
        let d = dirs();
        fs::write(d.staging.join("a.sh"), b"a").unwrap();
        promote(&d.staging, &d.validated).unwrap();
        fs::remove_file(d.staging.join("a.sh")).unwrap();

        let report = promote(&d.staging, &d.validated).unwrap();
        assert!(report.validated.contains(&ScriptName::new("a.sh")));
    }

    #[test]
    fn preserves_modification_time() {
        let d = dirs();
        let src = d.staging.join("a.sh");
        fs::write(&src, b"a").unwrap();
        let past = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        File::options()
            .write(true)
            .open(&src)
            .unwrap()
            .set_modified(past)
            .unwrap();

        promote(&d.staging, &d.validated).unwrap();
        let copied = fs::metadata(d.validated.join("a.sh")).unwrap().modified().unwrap();
        assert_eq!(copied, past);
    }

    #[test]
    fn creates_missing_directories() {
        let root = tempfile::tempdir().unwrap();
        let staging = root.path().join("scripts");
        let validated = root.path().join("validated_scripts");

        let report = promote(&staging, &validated).unwrap();
        assert!(staging.is_dir());
        assert!(validated.is_dir());
        assert!(report.validated.is_empty());
    }

    #[test]
    fn validated_set_includes_preexisting_scripts() {
        let d = dirs();
        fs::create_dir_all(&d.validated).unwrap();
        fs::write(d.validated.join("legacy.sh"), b"old").unwrap();
        fs::write(d.staging.join("new.sh"), b"new").unwrap();

        let report = promote(&d.staging, &d.validated).unwrap();
        let names: Vec<_> = report.validated.iter().map(ScriptName::as_str).collect();
        assert_eq!(names, vec!["legacy.sh", "new.sh"]);
    }

    #[test]
    fn no_temp_files_left_behind() {
        let d = dirs();
        fs::write(d.staging.join("a.sh"), b"a").unwrap();
        promote(&d.staging, &d.validated).unwrap();
        let count = fs::read_dir(&d.validated).unwrap().count();
        assert_eq!(count, 1);
    }
}
