use rand::Rng;
use scriptvault_schema::Digest;
use scriptvault_store::{compute_digest, StoreError, SHA256_EXTENSION};
use std::fmt;
use std::path::Path;

/// Per-script random secret handed to the signer.
///
/// Keyless schemes ignore it. It never leaves the signing step and is
/// dropped with the call frame that generated it.
pub struct Passphrase(String);

impl Passphrase {
    /// 16 random bytes, hex encoded.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 16];
        rand::rng().fill(&mut bytes);
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// Produces the signature published next to each script.
pub trait Signer {
    /// Extension of the signature files this signer produces, without the dot.
    fn extension(&self) -> &str;

    fn sign(&self, script: &Path, passphrase: &Passphrase) -> Result<Digest, StoreError>;
}

/// Content-integrity signer: streaming SHA-256 of the script bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Signer;

impl Signer for Sha256Signer {
    fn extension(&self) -> &str {
        SHA256_EXTENSION
    }

    fn sign(&self, script: &Path, _passphrase: &Passphrase) -> Result<Digest, StoreError> {
        compute_digest(script)
    }
}
