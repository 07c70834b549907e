// [apps/gateway/src/util.rs]
//! Small cross-handler helpers that don't warrant their own module.

use sha2::{Digest, Sha256};

/// The gateway is the network edge, so it's the one place responsible
/// for turning a caller's address into the SHA-256 digest every other
/// pillar stores instead of the raw IP.
pub fn hash_ip(ip: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(ip.as_bytes());
    hex::encode(hasher.finalize())
}
