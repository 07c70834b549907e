// [libs/infra/store/src/obsidian.rs]
/*!
 * APARATO: OBSIDIAN IN-MEMORY STORES
 * CLASIFICACIÓN: INFRA ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: IMPLEMENTACIÓN EN MEMORIA DE LOS PUERTOS DEL LEDGER
 *
 * The append-only invariant `LedgerAppendStore` documents as a DB
 * trigger in a relational deployment is enforced here simply by never
 * exposing a mutation path other than `append`.
 */

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use custodes_domain_models::{Dispute, LedgerEntry, LedgerQueryFilter, MerkleBlock};
use custodes_obsidian::errors::ObsidianError;
use custodes_obsidian::store::{DisputeStore, LedgerAppendStore, MerkleBlockStore, SequenceCounter};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
pub struct MemLedgerAppendStore {
    entries: RwLock<Vec<LedgerEntry>>,
}

#[async_trait]
impl LedgerAppendStore for MemLedgerAppendStore {
    async fn append(&self, entry: LedgerEntry) -> Result<(), ObsidianError> {
        self.entries.write().await.push(entry);
        Ok(())
    }

    async fn get(&self, block_index: u64) -> Result<Option<LedgerEntry>, ObsidianError> {
        Ok(self.entries.read().await.iter().find(|e| e.block_index == block_index).cloned())
    }

    async fn latest(&self) -> Result<Option<LedgerEntry>, ObsidianError> {
        Ok(self.entries.read().await.iter().max_by_key(|e| e.block_index).cloned())
    }

    async fn range(&self, from: u64, to: u64) -> Result<Vec<LedgerEntry>, ObsidianError> {
        Ok(self.entries.read().await.iter().filter(|e| e.block_index >= from && e.block_index <= to).cloned().collect())
    }

    async fn query(&self, filter: &LedgerQueryFilter) -> Result<Vec<LedgerEntry>, ObsidianError> {
        let entries = self.entries.read().await;
        let mut matched: Vec<LedgerEntry> = entries
            .iter()
            .filter(|e| filter.subject_id.map(|s| s == e.subject_id).unwrap_or(true))
            .filter(|e| filter.target_id.as_ref().map(|t| Some(t) == e.target_id.as_ref()).unwrap_or(true))
            .filter(|e| filter.event_types.as_ref().map(|types| types.contains(&e.event_type)).unwrap_or(true))
            .filter(|e| filter.min_severity.map(|min| e.severity >= min).unwrap_or(true))
            .filter(|e| filter.institution_id.map(|i| Some(i) == e.institution_id).unwrap_or(true))
            .filter(|e| filter.from_time.map(|t| e.timestamp >= t).unwrap_or(true))
            .filter(|e| filter.to_time.map(|t| e.timestamp <= t).unwrap_or(true))
            .cloned()
            .collect();

        matched.sort_by_key(|e| e.block_index);

        if let (Some(page), Some(page_size)) = (filter.page, filter.page_size) {
            let start = (page as usize) * (page_size as usize);
            matched = matched.into_iter().skip(start).take(page_size as usize).collect();
        }

        Ok(matched)
    }

    async fn by_target(&self, target_id: &str) -> Result<Vec<LedgerEntry>, ObsidianError> {
        Ok(self.entries.read().await.iter().filter(|e| e.target_id.as_deref() == Some(target_id)).cloned().collect())
    }

    async fn unsealed_since(&self, last_sealed_end: u64) -> Result<Vec<LedgerEntry>, ObsidianError> {
        Ok(self.entries.read().await.iter().filter(|e| e.block_index > last_sealed_end).cloned().collect())
    }

    async fn attach_merkle_root(&self, block_index: u64, root: &str) -> Result<(), ObsidianError> {
        let mut entries = self.entries.write().await;
        if let Some(entry) = entries.iter_mut().find(|e| e.block_index == block_index) {
            entry.merkle_root = Some(root.to_string());
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemSequenceCounter {
    next: AtomicU64,
}

#[async_trait]
impl SequenceCounter for MemSequenceCounter {
    async fn reserve_next(&self) -> Result<u64, ObsidianError> {
        Ok(self.next.fetch_add(1, Ordering::SeqCst))
    }

    async fn current(&self) -> Result<u64, ObsidianError> {
        Ok(self.next.load(Ordering::SeqCst))
    }
}

#[derive(Default)]
pub struct MemMerkleBlockStore {
    blocks: RwLock<Vec<MerkleBlock>>,
}

#[async_trait]
impl MerkleBlockStore for MemMerkleBlockStore {
    async fn persist(&self, block: MerkleBlock) -> Result<(), ObsidianError> {
        self.blocks.write().await.push(block);
        Ok(())
    }

    async fn latest_sealed_end(&self) -> Result<Option<u64>, ObsidianError> {
        Ok(self.blocks.read().await.iter().map(|b| b.entry_end).max())
    }

    async fn get(&self, block_number: u64) -> Result<Option<MerkleBlock>, ObsidianError> {
        Ok(self.blocks.read().await.iter().find(|b| b.block_number == block_number).cloned())
    }
}

#[derive(Default)]
pub struct MemDisputeStore {
    disputes: RwLock<HashMap<Uuid, Dispute>>,
}

#[async_trait]
impl DisputeStore for MemDisputeStore {
    async fn upsert(&self, dispute: Dispute) -> Result<(), ObsidianError> {
        self.disputes.write().await.insert(dispute.dispute_id, dispute);
        Ok(())
    }

    async fn get(&self, dispute_id: Uuid) -> Result<Option<Dispute>, ObsidianError> {
        Ok(self.disputes.read().await.get(&dispute_id).cloned())
    }
}

/// Concrete ledger instantiation every other pillar's sink adapter
/// wraps. A single instance is shared platform-wide since Obsidian is
/// the one append-only system of record.
pub type MemLedger = custodes_obsidian::Ledger<MemLedgerAppendStore, MemSequenceCounter, MemMerkleBlockStore, MemDisputeStore>;
