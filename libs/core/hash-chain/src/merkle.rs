// [libs/core/hash-chain/src/merkle.rs]
/*!
 * APARATO: MERKLE SEALING ENGINE
 * CLASIFICACIÓN: CORE PURE FUNCTIONS (ESTRATO L1)
 * RESPONSABILIDAD: CONSTRUCCIÓN, PRUEBA Y VERIFICACIÓN DE ÁRBOLES DE MERKLE
 *
 * Standard bottom-up pairwise SHA-256 tree. A level of odd length
 * duplicates its last node before pairing, matching the convention used
 * by essentially every hash-chained ledger (Bitcoin included).
 */

use sha2::{Digest, Sha256};

fn hash_pair(left: &str, right: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(left.as_bytes());
    hasher.update(right.as_bytes());
    hex::encode(hasher.finalize())
}

/// One level of the tree, leaves first (`levels[0]`), root last.
#[derive(Debug, Clone, Default)]
pub struct MerkleTree {
    pub levels: Vec<Vec<String>>,
}

impl MerkleTree {
    pub fn root(&self) -> String {
        self.levels
            .last()
            .and_then(|level| level.first())
            .cloned()
            .unwrap_or_else(zero_root)
    }

    pub fn leaf_count(&self) -> usize {
        self.levels.first().map(|l| l.len()).unwrap_or(0)
    }
}

/// 64 zero hex chars — used both as the genesis `prev_hash` and as the
/// root of an empty tree.
pub fn zero_root() -> String {
    "0".repeat(64)
}

/// Builds the full tree bottom-up from leaf hashes (hex strings).
/// An empty leaf list yields the zero root with no levels.
pub fn build_merkle(leaves: &[String]) -> MerkleTree {
    if leaves.is_empty() {
        return MerkleTree { levels: vec![] };
    }

    let mut levels: Vec<Vec<String>> = vec![leaves.to_vec()];

    while levels.last().unwrap().len() > 1 {
        let current = levels.last().unwrap();
        let mut next = Vec::with_capacity(current.len().div_ceil(2));
        let mut i = 0;
        while i < current.len() {
            let left = &current[i];
            let right = if i + 1 < current.len() { &current[i + 1] } else { left };
            next.push(hash_pair(left, right));
            i += 2;
        }
        levels.push(next);
    }

    MerkleTree { levels }
}

/// A single sibling-path step: the sibling hash and whether it sits to
/// the left of the node being climbed (needed to hash in the right
/// order when replaying the proof).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofStep {
    pub sibling_hash: String,
    pub sibling_is_left: bool,
}

/// Returns the sibling path from leaf `index` up to the root.
pub fn proof(index: usize, tree: &MerkleTree) -> Vec<ProofStep> {
    let mut steps = Vec::new();
    let mut idx = index;

    for level in &tree.levels {
        if level.len() <= 1 {
            break;
        }
        let is_right = idx % 2 == 1;
        let sibling_index = if is_right { idx - 1 } else { (idx + 1).min(level.len() - 1) };
        steps.push(ProofStep {
            sibling_hash: level[sibling_index].clone(),
            sibling_is_left: is_right,
        });
        idx /= 2;
    }

    steps
}

/// Replays a proof upward from `leaf` and checks it reproduces `root`.
pub fn verify_proof(leaf: &str, path: &[ProofStep], root: &str) -> bool {
    let mut current = leaf.to_string();
    for step in path {
        current = if step.sibling_is_left {
            hash_pair(&step.sibling_hash, &current)
        } else {
            hash_pair(&current, &step.sibling_hash)
        };
    }
    current == root
}
