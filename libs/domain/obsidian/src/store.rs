// [libs/domain/obsidian/src/store.rs]
/*!
 * APARATO: OBSIDIAN STORE CONTRACTS
 * CLASIFICACIÓN: STORE ABSTRACTIONS (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE LOS PUERTOS DE PERSISTENCIA DEL LEDGER
 *
 * These traits are the boundary `libs/infra/store` implements. The
 * design notes call for "any relational or KV store" to suffice as long
 * as it honors the invariants documented on each method — in particular,
 * the backing table behind `LedgerAppendStore` must physically refuse
 * UPDATE/DELETE (a DB trigger, in a relational deployment).
 */

use async_trait::async_trait;
use custodes_domain_models::{Dispute, LedgerEntry, LedgerQueryFilter, MerkleBlock};
use uuid::Uuid;

use crate::errors::ObsidianError;

/// The append-only entry table. `append` must be atomic with respect to
/// `block_index` uniqueness: two concurrent appenders racing for the
/// same index must have exactly one succeed.
#[async_trait]
pub trait LedgerAppendStore: Send + Sync {
    async fn append(&self, entry: LedgerEntry) -> Result<(), ObsidianError>;
    async fn get(&self, block_index: u64) -> Result<Option<LedgerEntry>, ObsidianError>;
    async fn latest(&self) -> Result<Option<LedgerEntry>, ObsidianError>;
    async fn range(&self, from: u64, to: u64) -> Result<Vec<LedgerEntry>, ObsidianError>;
    async fn query(&self, filter: &LedgerQueryFilter) -> Result<Vec<LedgerEntry>, ObsidianError>;
    async fn by_target(&self, target_id: &str) -> Result<Vec<LedgerEntry>, ObsidianError>;
    /// Entries with `block_index` greater than `last_sealed_end` —
    /// used by the sealer's crash-recovery path.
    async fn unsealed_since(&self, last_sealed_end: u64) -> Result<Vec<LedgerEntry>, ObsidianError>;
    async fn attach_merkle_root(&self, block_index: u64, root: &str) -> Result<(), ObsidianError>;
}

/// The global total-order clock for ledger writes. Implementations must
/// be strongly atomic across replicas (single-leader or CAS).
#[async_trait]
pub trait SequenceCounter: Send + Sync {
    /// Reserves and returns the next `block_index`. Once returned, the
    /// caller is committed to appending at that index — a cancelled
    /// commit must call this only after the append is guaranteed to
    /// proceed, never before.
    async fn reserve_next(&self) -> Result<u64, ObsidianError>;
    async fn current(&self) -> Result<u64, ObsidianError>;
}

#[async_trait]
pub trait MerkleBlockStore: Send + Sync {
    async fn persist(&self, block: MerkleBlock) -> Result<(), ObsidianError>;
    async fn latest_sealed_end(&self) -> Result<Option<u64>, ObsidianError>;
    async fn get(&self, block_number: u64) -> Result<Option<MerkleBlock>, ObsidianError>;
}

/// Dispute records. These are regular (non-append-only) rows — the
/// immutability guarantee applies only to the ledger entry table.
#[async_trait]
pub trait DisputeStore: Send + Sync {
    async fn upsert(&self, dispute: Dispute) -> Result<(), ObsidianError>;
    async fn get(&self, dispute_id: Uuid) -> Result<Option<Dispute>, ObsidianError>;
}
