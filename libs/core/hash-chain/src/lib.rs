// [libs/core/hash-chain/src/lib.rs]
/*!
 * APARATO: HASHCHAIN CORE
 * CLASIFICACIÓN: CORE LIBRARY (ESTRATO L1)
 * RESPONSABILIDAD: ENCADENAMIENTO SHA-256, SELLADO MERKLE Y VERIFICACIÓN
 *
 * Pure functions only — no I/O, no store access. `libs/domain/obsidian`
 * is the only caller that should need this crate directly; everything
 * here is deterministic and side-effect free so it can be fuzzed and
 * proptested in isolation from the ledger's storage concerns.
 */

pub mod canonical;
pub mod errors;
pub mod merkle;

pub use canonical::{canonicalize, CanonicalEntry};
pub use errors::ChainFault;
pub use merkle::{build_merkle, proof, verify_proof, zero_root, MerkleTree, ProofStep};

use sha2::{Digest, Sha256};

/// `payload_hash = SHA-256(canonicalize(entry))`.
pub fn payload_hash(entry: &CanonicalEntry) -> String {
    sha256_hex(canonicalize(entry).as_bytes())
}

/// `block_hash = SHA-256(payload_hash ":" prev_hash ":" decimal(block_index))`.
pub fn block_hash(payload_hash: &str, prev_hash: &str, block_index: u64) -> String {
    let joined = format!("{payload_hash}:{prev_hash}:{block_index}");
    sha256_hex(joined.as_bytes())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Minimal projection of a committed entry needed to verify the chain —
/// the recomputed payload/block hashes plus the linkage fields.
#[derive(Debug, Clone)]
pub struct ChainLink {
    pub block_index: u64,
    pub prev_hash: String,
    pub block_hash: String,
    pub canonical: CanonicalEntry,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainVerification {
    pub valid: bool,
    pub first_invalid_block: Option<u64>,
    pub entries_checked: u64,
}

/// Sorts by `block_index`, recomputes `payload_hash`/`block_hash` for
/// every entry, and checks `prev_hash` linkage. Returns the index of the
/// first offending block on failure.
pub fn verify_chain(entries: &[ChainLink]) -> ChainVerification {
    let mut sorted: Vec<&ChainLink> = entries.iter().collect();
    sorted.sort_by_key(|e| e.block_index);

    let mut checked: u64 = 0;
    for (position, link) in sorted.iter().enumerate() {
        checked += 1;

        let recomputed_payload = payload_hash(&link.canonical);
        let recomputed_block = block_hash(&recomputed_payload, &link.prev_hash, link.block_index);
        if recomputed_block != link.block_hash {
            return ChainVerification {
                valid: false,
                first_invalid_block: Some(link.block_index),
                entries_checked: checked,
            };
        }

        if position > 0 {
            let predecessor = sorted[position - 1];
            if link.prev_hash != predecessor.block_hash {
                return ChainVerification {
                    valid: false,
                    first_invalid_block: Some(link.block_index),
                    entries_checked: checked,
                };
            }
        }
    }

    ChainVerification {
        valid: true,
        first_invalid_block: None,
        entries_checked: checked,
    }
}
