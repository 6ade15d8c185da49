use super::{json_pretty, EXIT_SUCCESS};
use scriptvault_schema::{extract_from_reader, HeaderField};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn run(script: &Path, json: bool) -> Result<u8, String> {
    let file = File::open(script).map_err(|e| format!("cannot open {}: {e}", script.display()))?;
    let meta = extract_from_reader(BufReader::new(file))
        .map_err(|e| format!("cannot read {}: {e}", script.display()))?;

    if json {
        let fields: BTreeMap<&str, &str> = meta.iter().map(|(f, v)| (f.as_str(), v)).collect();
        println!("{}", json_pretty(&fields)?);
    } else {
        for field in HeaderField::ALL {
            match meta.get(field) {
                Some(value) => println!("{field:<12} {value}"),
                None => println!("{field:<12} -"),
            }
        }
    }
    Ok(EXIT_SUCCESS)
}
