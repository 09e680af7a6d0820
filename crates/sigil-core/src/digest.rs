//! SHA-256 content digests in `sha256:<hex>` form.

use sha2::{Digest, Sha256};

/// Compute the content-addressed identifier of a byte slice.
pub fn sha256_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("sha256:{}", hex::encode(hasher.finalize()))
}
