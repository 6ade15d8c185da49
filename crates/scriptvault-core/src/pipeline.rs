use crate::signer::{Passphrase, Sha256Signer, Signer};
use crate::CoreError;
use chrono::{DateTime, Local};
use scriptvault_schema::{
    extract_from_reader, format_timestamp, Locations, Manifest, ManifestRecord, ScriptName,
    Settings, SETTINGS_FILE,
};
use scriptvault_store::{
    list_scripts, promote, write_atomic, PromotionReport, PublishLayout, SignatureStore,
};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Publishing pipeline over one catalog base directory.
///
/// A run promotes staging scripts, signs every validated script, extracts
/// header metadata, and rewrites the manifest from scratch. Runs keep no
/// state between them, so an interrupted run is repaired by running again.
pub struct Pipeline<S: Signer = Sha256Signer> {
    layout: PublishLayout,
    settings: Settings,
    signer: S,
}

/// Result of a completed pipeline run.
#[derive(Debug)]
pub struct BuildReport {
    pub manifest_path: PathBuf,
    pub manifest: Manifest,
    /// Scripts with a manifest record, in manifest order.
    pub published: Vec<ScriptName>,
    pub skipped: Vec<SkippedScript>,
    /// Scripts whose leftover signature was deleted because the script is gone.
    pub pruned: Vec<ScriptName>,
    pub promotion: PromotionReport,
    pub completed_at: DateTime<Local>,
}

/// A validated script left out of the manifest because processing it failed.
#[derive(Debug)]
pub struct SkippedScript {
    pub name: ScriptName,
    pub reason: String,
}

impl Pipeline<Sha256Signer> {
    pub fn new(base: impl Into<PathBuf>, settings: Settings) -> Self {
        Self::with_signer(base, settings, Sha256Signer)
    }

    /// Load settings (by default `settings.yaml` inside `base`) and build a pipeline.
    pub fn load(base: impl Into<PathBuf>, settings_path: Option<&Path>) -> Result<Self, CoreError> {
        let base = base.into();
        let path = settings_path.map_or_else(|| base.join(SETTINGS_FILE), Path::to_path_buf);
        debug!("loading settings from {}", path.display());
        let settings = Settings::load(&path)?;
        Ok(Self::new(base, settings))
    }
}

impl<S: Signer> Pipeline<S> {
    pub fn with_signer(base: impl Into<PathBuf>, settings: Settings, signer: S) -> Self {
        Self {
            layout: PublishLayout::new(base),
            settings,
            signer,
        }
    }

    pub fn layout(&self) -> &PublishLayout {
        &self.layout
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.settings.manifest_path_in(self.layout.root())
    }

    pub fn signature_store(&self) -> SignatureStore {
        SignatureStore::new(&self.layout, self.signer.extension())
    }

    pub fn locations(&self) -> Locations {
        Locations {
            script_prefix: self.settings.script_location_prefix.clone(),
            signature_prefix: self.settings.signature_location_prefix.clone(),
            signature_extension: self.signer.extension().to_owned(),
        }
    }

    /// Promote staging scripts without signing or writing the manifest.
    pub fn promote(&self) -> Result<PromotionReport, CoreError> {
        self.layout.initialize()?;
        Ok(promote(
            &self.layout.staging_dir(),
            &self.layout.validated_dir(),
        )?)
    }

    /// Run the full pipeline once.
    ///
    /// Directory setup and the manifest write are fatal. A failure on a
    /// single script is logged, recorded in [`BuildReport::skipped`], and
    /// the run continues with the next script.
    pub fn run(&self) -> Result<BuildReport, CoreError> {
        info!("publishing catalog at {}", self.layout.root().display());
        let promotion = self.promote()?;
        for failure in &promotion.failed {
            warn!("could not promote {}: {}", failure.name, failure.reason);
        }

        let signatures = self.signature_store();
        let locations = self.locations();
        let scripts = list_scripts(&self.layout.validated_dir())?;
        debug!("{} validated scripts to publish", scripts.len());

        let mut records = Vec::with_capacity(scripts.len());
        let mut published = Vec::with_capacity(scripts.len());
        let mut skipped = Vec::new();
        for name in &scripts {
            match self.publish_one(name, &signatures, &locations) {
                Ok(record) => {
                    records.push(record);
                    published.push(name.clone());
                }
                Err(e) => {
                    warn!("skipping {name}: {e}");
                    skipped.push(SkippedScript {
                        name: name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }
        let pruned = prune_signatures(&signatures, &scripts)?;

        let manifest = Manifest::new(records);
        let manifest_path = self.manifest_path();
        write_manifest(&manifest_path, &manifest)?;

        let completed_at = Local::now();
        info!(
            "wrote {} records to {} ({} skipped)",
            manifest.len(),
            manifest_path.display(),
            skipped.len()
        );

        Ok(BuildReport {
            manifest_path,
            manifest,
            published,
            skipped,
            pruned,
            promotion,
            completed_at,
        })
    }

    fn publish_one(
        &self,
        name: &ScriptName,
        signatures: &SignatureStore,
        locations: &Locations,
    ) -> Result<ManifestRecord, CoreError> {
        let path = self.layout.validated_script(name);

        let passphrase = Passphrase::generate();
        let digest = self.signer.sign(&path, &passphrase)?;
        drop(passphrase);
        signatures.put(name, &digest)?;
        debug!("signed {name}: {digest}");

        let file = File::open(&path)?;
        let metadata = extract_from_reader(BufReader::new(&file))?;
        let modified = file.metadata()?.modified()?;

        Ok(ManifestRecord::build(
            name,
            &metadata,
            locations,
            format_timestamp(modified),
        ))
    }
}

/// Delete signatures whose script is not in `scripts`.
///
/// A failed delete is logged and the file is left for the next run.
fn prune_signatures(
    signatures: &SignatureStore,
    scripts: &[ScriptName],
) -> Result<Vec<ScriptName>, CoreError> {
    let current: BTreeSet<&ScriptName> = scripts.iter().collect();
    let mut pruned = Vec::new();
    for name in signatures.list()? {
        if current.contains(&name) {
            continue;
        }
        match signatures.remove(&name) {
            Ok(()) => {
                debug!("removed stale signature for {name}");
                pruned.push(name);
            }
            Err(e) => warn!("could not remove stale signature for {name}: {e}"),
        }
    }
    Ok(pruned)
}

/// Serialize `manifest` and atomically replace the file at `path`.
pub fn write_manifest(path: &Path, manifest: &Manifest) -> Result<(), CoreError> {
    let yaml = manifest.to_yaml()?;
    write_atomic(path, yaml.as_bytes())?;
    Ok(())
}

/// Read a previously written manifest.
pub fn read_manifest(path: &Path) -> Result<Manifest, CoreError> {
    let content = std::fs::read_to_string(path)?;
    Ok(Manifest::from_yaml(&content)?)
}
