//! Cache key generation using SHA-256 hashes

use sha2::{Digest, Sha256};

/// Generate a deterministic cache key from a fetch target.
///
/// The key is a SHA-256 hash of the URL and the sorted query parameters, so
/// the same request yields the same key regardless of parameter order.
/// Request headers are deliberately not part of the identity.
pub fn cache_key(url: &str, params: &[(&str, &str)]) -> String {
    let mut hasher = Sha256::new();

    update_field(&mut hasher, url);

    let mut sorted_params: Vec<_> = params.iter().collect();
    sorted_params.sort();

    for (k, v) in sorted_params {
        update_field(&mut hasher, k);
        update_field(&mut hasher, v);
    }

    format!("{:x}", hasher.finalize())
}

/// Length-prefixed so separators inside a field cannot shift field boundaries
fn update_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

/// Hex SHA-256 digest of a payload, used to name blob files
pub fn content_digest(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
