use crate::digest::compute_digest;
use crate::layout::PublishLayout;
use crate::signatures::SignatureStore;
use crate::{list_scripts, StoreError};
use scriptvault_schema::ScriptName;
use std::collections::BTreeSet;

#[derive(Debug, Default)]
pub struct IntegrityReport {
    pub checked: usize,
    pub passed: usize,
    pub failed: Vec<IntegrityFailure>,
    /// Signature files whose script is not in the validated directory.
    pub orphaned: Vec<ScriptName>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.orphaned.is_empty()
    }
}

#[derive(Debug)]
pub struct IntegrityFailure {
    pub name: ScriptName,
    pub reason: String,
}

/// Recompute every validated script's digest and compare it with its stored signature.
pub fn verify_signatures(
    layout: &PublishLayout,
    signatures: &SignatureStore,
) -> Result<IntegrityReport, StoreError> {
    let scripts = list_scripts(&layout.validated_dir())?;
    let mut report = IntegrityReport {
        checked: scripts.len(),
        ..Default::default()
    };

    for name in &scripts {
        let stored = match signatures.get(name) {
            Ok(d) => d,
            Err(StoreError::SignatureNotFound(_)) => {
                report.failed.push(IntegrityFailure {
                    name: name.clone(),
                    reason: "signature missing".to_owned(),
                });
                continue;
            }
            Err(e) => {
                report.failed.push(IntegrityFailure {
                    name: name.clone(),
                    reason: format!("signature read error: {e}"),
                });
                continue;
            }
        };

        match compute_digest(&layout.validated_script(name)) {
            Ok(actual) if actual == stored => report.passed += 1,
            Ok(actual) => report.failed.push(IntegrityFailure {
                name: name.clone(),
                reason: format!("digest mismatch: expected {stored}, got {actual}"),
            }),
            Err(e) => report.failed.push(IntegrityFailure {
                name: name.clone(),
                reason: format!("script read error: {e}"),
            }),
        }
    }

    let known: BTreeSet<&ScriptName> = scripts.iter().collect();
    report.orphaned = signatures
        .list()?
        .into_iter()
        .filter(|name| !known.contains(name))
        .collect();

    Ok(report)
}
