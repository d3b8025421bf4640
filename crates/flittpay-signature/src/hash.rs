// SHA-1 hashing utilities for Flitt signatures

use sha1::{Digest, Sha1};

/// Computes the SHA-1 hash of the input bytes and returns it as a lowercase hex string.
pub fn sha1_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    hex::encode(result)
}
