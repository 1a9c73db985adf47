//! Content hashing over encoded buffers.

use sha2::{Digest, Sha256};

/// A SHA-256 digest.
pub type ContentHash = [u8; 32];

/// Hashes an encoded buffer.
///
/// Accepts any buffer this crate produces (`buf()`, `to_bytes()`), or the
/// exact bytes a mapped object was decoded from.
pub fn content_hash(buf: &[u8]) -> ContentHash {
    let hash = Sha256::digest(buf);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    out
}

/// Formats a digest as lowercase hex.
pub fn format_hash(hash: &ContentHash) -> String {
    let mut s = String::with_capacity(64);
    for byte in hash {
        s.push_str(&format!("{:02x}", byte));
    }
    s
}
