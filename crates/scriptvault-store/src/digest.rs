use crate::StoreError;
use scriptvault_schema::Digest;
use sha2::{Digest as _, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read size for streaming digests. Memory use is bounded by this, not by file size.
pub const CHUNK_SIZE: usize = 8192;

/// Compute the SHA-256 digest of a file as lowercase hex.
pub fn compute_digest(path: &Path) -> Result<Digest, StoreError> {
    let file = File::open(path)?;
    digest_reader(file)
}

/// Compute the SHA-256 digest of everything `reader` yields.
pub fn digest_reader<R: Read>(mut reader: R) -> Result<Digest, StoreError> {
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(Digest::new(format!("{:x}", hasher.finalize())))
}
