use super::{json_pretty, load_pipeline, EXIT_SUCCESS};
use scriptvault_core::read_manifest;
use scriptvault_schema::HeaderField;
use std::path::Path;

pub fn run(base: &Path, settings: Option<&Path>, json: bool) -> Result<u8, String> {
    let pipeline = load_pipeline(base, settings)?;
    let path = pipeline.manifest_path();
    if !path.exists() {
        return Err(format!(
            "no manifest at {}; run 'scriptvault build' first",
            path.display()
        ));
    }
    let manifest = read_manifest(&path).map_err(|e| e.to_string())?;

    if json {
        println!("{}", json_pretty(&manifest)?);
    } else if manifest.is_empty() {
        println!("manifest is empty");
    } else {
        for (i, record) in manifest.records().iter().enumerate() {
            let title = record.header(HeaderField::Title).unwrap_or("(untitled)");
            let author = record.header(HeaderField::Author).unwrap_or("unknown");
            println!("{:>3}  {title} by {author}", i + 1);
            println!("     {}", record.script_location);
            println!("     updated {}", record.last_modified);
        }
    }
    Ok(EXIT_SUCCESS)
}
