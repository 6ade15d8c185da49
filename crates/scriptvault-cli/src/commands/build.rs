use super::{json_pretty, load_pipeline, spin_fail, spin_ok, spinner, stamp, EXIT_SUCCESS};
use scriptvault_schema::LAST_MODIFIED_FORMAT;
use std::path::Path;

pub fn run(base: &Path, settings: Option<&Path>, json: bool) -> Result<u8, String> {
    let pipeline = load_pipeline(base, settings)?;

    let pb = if json {
        None
    } else {
        Some(spinner("publishing scripts..."))
    };

    let report = match pipeline.run() {
        Ok(r) => {
            if let Some(ref pb) = pb {
                spin_ok(pb, "catalog published");
            }
            r
        }
        Err(e) => {
            if let Some(ref pb) = pb {
                spin_fail(pb, "publish failed");
            }
            return Err(e.to_string());
        }
    };

    for failure in &report.promotion.failed {
        eprintln!("warning: could not promote {}: {}", failure.name, failure.reason);
    }
    for skipped in &report.skipped {
        eprintln!("warning: skipped {}: {}", skipped.name, skipped.reason);
    }

    let completed_at = report.completed_at.format(LAST_MODIFIED_FORMAT).to_string();
    if json {
        let skipped: Vec<_> = report
            .skipped
            .iter()
            .map(|s| serde_json::json!({ "name": s.name, "reason": s.reason }))
            .collect();
        let payload = serde_json::json!({
            "manifest": report.manifest_path.display().to_string(),
            "records": report.manifest.len(),
            "published": report.published,
            "promoted": report.promotion.promoted,
            "skipped": skipped,
            "pruned": report.pruned,
            "completed_at": completed_at,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!(
            "{} Data has been saved to {}.",
            stamp(&completed_at),
            report.manifest_path.display()
        );
    }
    Ok(EXIT_SUCCESS)
}
