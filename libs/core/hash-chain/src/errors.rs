// [libs/core/hash-chain/src/errors.rs]
//! Error catalog for the HashChain primitives — the `ChainFault` family
//! every pillar's chain-facing errors wrap.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainFault {
    #[error("[CHAIN_SEQUENCE_GAP]: expected block_index {expected}, found {found}")]
    SequenceGap { expected: u64, found: u64 },

    #[error("[CHAIN_PREV_HASH_MISMATCH]: block {block_index} prev_hash does not match predecessor block_hash")]
    PrevHashMismatch { block_index: u64 },

    #[error("[CHAIN_PAYLOAD_HASH_MISMATCH]: block {block_index} payload_hash does not match recomputed canonical hash")]
    PayloadHashMismatch { block_index: u64 },

    #[error("[CHAIN_MISSING_ENTRY]: no entry found at block_index {block_index}")]
    MissingEntry { block_index: u64 },

    #[error("[CHAIN_SEAL_FAILED]: sealing block could not complete: {0}")]
    SealFailed(String),

    #[error("[CHAIN_EVIDENCE_SIGN_FAILED]: evidence package signing failed: {0}")]
    EvidenceSignFailed(String),
}
