use super::{json_pretty, EXIT_STORE_ERROR, EXIT_SUCCESS};
use scriptvault_store::{verify_signatures, PublishLayout, SignatureStore, SHA256_EXTENSION};
use std::path::Path;

pub fn run(base: &Path, json: bool) -> Result<u8, String> {
    let layout = PublishLayout::new(base);
    let signatures = SignatureStore::new(&layout, SHA256_EXTENSION);
    let report =
        verify_signatures(&layout, &signatures).map_err(|e| format!("store error: {e}"))?;

    if json {
        let failed: Vec<_> = report
            .failed
            .iter()
            .map(|f| serde_json::json!({ "name": f.name, "reason": f.reason }))
            .collect();
        let payload = serde_json::json!({
            "checked": report.checked,
            "passed": report.passed,
            "failed": failed,
            "orphaned": report.orphaned,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "signature integrity: {}/{} scripts passed",
            report.passed, report.checked
        );
        for f in &report.failed {
            println!("  FAIL {}: {}", f.name, f.reason);
        }
        for name in &report.orphaned {
            println!("  ORPHAN {name}.{}", signatures.extension());
        }
    }

    if report.is_clean() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_STORE_ERROR)
    }
}
