use super::{json_pretty, load_pipeline, EXIT_FAILURE, EXIT_SUCCESS};
use std::path::Path;

pub fn run(base: &Path, settings: Option<&Path>, json: bool) -> Result<u8, String> {
    let pipeline = load_pipeline(base, settings)?;
    let report = pipeline.promote().map_err(|e| e.to_string())?;

    if json {
        let failed: Vec<_> = report
            .failed
            .iter()
            .map(|f| serde_json::json!({ "name": f.name, "reason": f.reason }))
            .collect();
        let payload = serde_json::json!({
            "promoted": report.promoted,
            "already_present": report.already_present,
            "failed": failed,
            "validated": report.validated.len(),
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        for name in &report.promoted {
            println!("promoted {name}");
        }
        for f in &report.failed {
            eprintln!("warning: could not promote {}: {}", f.name, f.reason);
        }
        println!(
            "{} promoted, {} already validated, {} in catalog",
            report.promoted.len(),
            report.already_present.len(),
            report.validated.len()
        );
    }

    if report.failed.is_empty() {
        Ok(EXIT_SUCCESS)
    } else {
        Ok(EXIT_FAILURE)
    }
}
