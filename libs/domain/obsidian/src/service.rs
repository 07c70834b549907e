// [libs/domain/obsidian/src/service.rs]
/*!
 * APARATO: LEDGER ENGINE
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: APPEND ATÓMICO, SELLADO MERKLE, CONSULTA Y DISPUTAS
 *
 * `commit` is the only mutation path; every other write (seal, dispute
 * open/resolve) is itself expressed as one or more commits so the
 * ledger never accumulates state outside its own chain. A single
 * `tokio::sync::Mutex` serializes the read-prev-hash / reserve-index /
 * append critical section — the store traits alone don't guarantee
 * that ordering across concurrent callers, and the chain invariant that
 * reserved index N must be appended before any appender observes
 * (N+1)'s prev_hash needs a single writer somewhere in the stack. Here,
 * not in the store.
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use custodes_core_hashchain::{self as hashchain, block_hash, build_merkle, payload_hash, proof, zero_root, ChainLink};
use custodes_domain_models::{
    ChainVerificationReport, CommitEventRequest, CommitResult, Dispute, DisputeReason, DisputeStatus,
    EventType, EvidencePackage, EvidenceSubjectKind, LedgerEntry, LedgerQueryFilter, LedgerQueryResult,
    MerkleBlock, Severity,
};
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::errors::ObsidianError;
use crate::signing::LedgerSigner;
use crate::store::{DisputeStore, LedgerAppendStore, MerkleBlockStore, SequenceCounter};

pub struct Ledger<A, S, M, D>
where
    A: LedgerAppendStore,
    S: SequenceCounter,
    M: MerkleBlockStore,
    D: DisputeStore,
{
    append_store: Arc<A>,
    sequence: Arc<S>,
    merkle_store: Arc<M>,
    dispute_store: Arc<D>,
    signer: LedgerSigner,
    config: LedgerConfig,
    /// In-flight entries buffered since the last seal. Single-writer: the
    /// appender drains it itself rather than handing sealing to a
    /// separate task, satisfying the "single writer per ledger instance"
    /// design note without a second background loop per instance.
    buffer: Mutex<Vec<LedgerEntry>>,
    /// Serializes the reserve-index / read-prev-hash / append sequence.
    write_lock: Mutex<()>,
}

impl<A, S, M, D> Ledger<A, S, M, D>
where
    A: LedgerAppendStore,
    S: SequenceCounter,
    M: MerkleBlockStore,
    D: DisputeStore,
{
    pub fn new(append_store: Arc<A>, sequence: Arc<S>, merkle_store: Arc<M>, dispute_store: Arc<D>, config: LedgerConfig) -> Self {
        let signer = LedgerSigner::new(config.signing_key.clone());
        Self {
            append_store,
            sequence,
            merkle_store,
            dispute_store,
            signer,
            config,
            buffer: Mutex::new(Vec::new()),
            write_lock: Mutex::new(()),
        }
    }

    /// Atomically reserves the next `block_index`, builds the full entry
    /// with computed hashes, and appends it. Seals the in-flight block
    /// once the buffer reaches `merkle_block_size`.
    #[instrument(skip(self, request), fields(event_type = ?request.event_type))]
    pub async fn commit(&self, request: CommitEventRequest) -> Result<CommitResult, ObsidianError> {
        let severity = request.severity.unwrap_or_else(|| request.event_type.default_severity());

        let _guard = self.write_lock.lock().await;

        let prev_hash = match self.append_store.latest().await? {
            Some(latest) => latest.block_hash,
            None => zero_root(),
        };
        let block_index = self.sequence.reserve_next().await?;

        let entry_id = Uuid::new_v4();
        let timestamp = Utc::now();

        let mut entry = LedgerEntry {
            entry_id,
            block_index,
            event_type: request.event_type,
            severity,
            subject_id: request.subject_id,
            passport_id: request.passport_id,
            institution_id: request.institution_id,
            target_id: request.target_id,
            target_type: request.target_type,
            metadata: request.metadata,
            ip_hash: request.ip_hash,
            region: request.region,
            timestamp,
            sequence: block_index,
            prev_hash: prev_hash.clone(),
            payload_hash: String::new(),
            block_hash: String::new(),
            merkle_root: None,
        };

        let canonical = entry.to_canonical();
        let computed_payload_hash = payload_hash(&canonical);
        let computed_block_hash = block_hash(&computed_payload_hash, &prev_hash, block_index);
        entry.payload_hash = computed_payload_hash;
        entry.block_hash = computed_block_hash.clone();

        self.append_store.append(entry.clone()).await?;
        drop(_guard);

        let mut buffer = self.buffer.lock().await;
        buffer.push(entry);
        let should_seal = buffer.len() >= self.config.merkle_block_size;
        drop(buffer);

        if should_seal {
            if let Err(err) = self.seal_block().await {
                warn!(error = %err, "block seal failed after reaching configured size; buffer retained for retry");
            }
        }

        Ok(CommitResult { entry_id, block_index, block_hash: computed_block_hash, timestamp })
    }

    pub async fn query(&self, filter: &LedgerQueryFilter) -> Result<LedgerQueryResult, ObsidianError> {
        let mut entries = self.append_store.query(filter).await?;
        entries.sort_by_key(|e| e.block_index);

        let page = filter.page.unwrap_or(0) as usize;
        let page_size = filter.page_size.unwrap_or(50).max(1) as usize;
        let total = entries.len() as u64;
        let from_block = entries.first().map(|e| e.block_index);
        let to_block = entries.last().map(|e| e.block_index);

        let page_entries: Vec<LedgerEntry> = entries.into_iter().skip(page * page_size).take(page_size).collect();
        let query_hash = filter_hash(filter);

        Ok(LedgerQueryResult { entries: page_entries, total, from_block, to_block, query_hash })
    }

    /// Fetches every entry in `[from, to]`, recomputes hashes, and checks
    /// linkage. Returns the first offending block_index on failure.
    pub async fn verify_chain_range(&self, from: u64, to: u64) -> Result<ChainVerificationReport, ObsidianError> {
        let entries = self.append_store.range(from, to).await?;
        let links: Vec<ChainLink> = entries.iter().map(to_chain_link).collect();
        let result = hashchain::verify_chain(&links);

        Ok(ChainVerificationReport {
            valid: result.valid,
            first_invalid_block: result.first_invalid_block,
            entries_checked: result.entries_checked,
            error: if result.valid { None } else { Some("chain linkage or hash mismatch detected".to_string()) },
        })
    }

    /// Collects every entry related to `(kind, id)`, seals them into a
    /// standalone Merkle tree, and signs the package over its identity
    /// and root — independent of whatever block(s) the member entries
    /// originally sealed into.
    #[instrument(skip(self))]
    pub async fn generate_evidence_package(&self, kind: EvidenceSubjectKind, id: &str) -> Result<EvidencePackage, ObsidianError> {
        let mut entries = self.append_store.by_target(id).await?;
        entries.sort_by_key(|e| e.block_index);

        if entries.is_empty() {
            return Err(ObsidianError::NotFound(format!("no ledger entries reference {id:?}")));
        }

        let leaves: Vec<String> = entries.iter().map(|e| e.block_hash.clone()).collect();
        let tree = build_merkle(&leaves);
        let root = tree.root();

        let package_id = Uuid::new_v4();
        let generated_at = Utc::now();
        let entry_count = entries.len();

        let proofs: Vec<_> = (0..entry_count).map(|i| proof(i, &tree)).collect();
        let entry_ids: Vec<Uuid> = entries.iter().map(|e| e.entry_id).collect();

        let message = format!("{package_id}:{kind:?}:{id}:{root}:{generated_at}:{entry_count}");
        let signature = self.signer.sign(&message);

        info!(package_id = %package_id, entry_count, "evidence package generated");

        Ok(EvidencePackage {
            package_id,
            kind,
            subject_ref: id.to_string(),
            entry_ids,
            merkle_root: root,
            proofs,
            generated_at,
            signature,
        })
    }

    /// Builds the tree over the in-flight buffer, signs the root,
    /// persists the `MerkleBlock`, back-annotates every member entry,
    /// and clears the buffer. A no-op when the buffer is empty.
    #[instrument(skip(self))]
    pub async fn seal_block(&self) -> Result<Option<MerkleBlock>, ObsidianError> {
        let mut buffer = self.buffer.lock().await;
        if buffer.is_empty() {
            return Ok(None);
        }
        let members: Vec<LedgerEntry> = std::mem::take(&mut *buffer);
        drop(buffer);

        let block = self.seal_entries(members).await?;
        Ok(Some(block))
    }

    /// Crash-recovery path: loads every entry with `block_index` past the
    /// last sealed end and seals them. Called at startup by the binary
    /// that owns the sealer (the watchdog) before serving traffic.
    #[instrument(skip(self))]
    pub async fn recover_and_seal(&self) -> Result<Option<MerkleBlock>, ObsidianError> {
        let last_sealed_end = self.merkle_store.latest_sealed_end().await?.unwrap_or(0);
        let unsealed = self.append_store.unsealed_since(last_sealed_end).await?;
        if unsealed.is_empty() {
            return Ok(None);
        }
        let mut unsealed = unsealed;
        unsealed.sort_by_key(|e| e.block_index);
        let block = self.seal_entries(unsealed).await?;
        Ok(Some(block))
    }

    async fn seal_entries(&self, mut members: Vec<LedgerEntry>) -> Result<MerkleBlock, ObsidianError> {
        members.sort_by_key(|e| e.block_index);
        let leaves: Vec<String> = members.iter().map(|e| e.block_hash.clone()).collect();
        let tree = build_merkle(&leaves);
        let root = tree.root();

        let entry_start = members.first().map(|e| e.block_index).unwrap_or(0);
        let entry_end = members.last().map(|e| e.block_index).unwrap_or(0);
        let sealed_at = Utc::now();
        let sealed_by = self.config.instance_id.clone();

        let message = format!("{sealed_by}:{entry_start}:{entry_end}:{root}:{sealed_at}");
        let signature = self.signer.sign(&message);

        let block_number = entry_start / self.config.merkle_block_size.max(1) as u64;

        let block = MerkleBlock { block_number, entry_start, entry_end, leaves, merkle_root: root.clone(), sealed_at, sealed_by, signature };

        self.merkle_store.persist(block.clone()).await?;
        for entry in &members {
            self.append_store.attach_merkle_root(entry.block_index, &root).await?;
        }

        info!(entry_start, entry_end, merkle_root = %root, "block sealed");
        Ok(block)
    }

    /// Collects every entry targeting `job_id` as evidence, stamps a
    /// `DISPUTE_OPENED` entry in the chain, and records the dispute.
    #[instrument(skip(self))]
    pub async fn open_dispute(&self, job_id: Uuid, raised_by_subject_id: Uuid, reason: DisputeReason, ip_hash: String) -> Result<Dispute, ObsidianError> {
        let evidence = self.append_store.by_target(&job_id.to_string()).await?;
        let evidence_entry_ids: Vec<Uuid> = evidence.iter().map(|e| e.entry_id).collect();

        let mut metadata = BTreeMap::new();
        metadata.insert("reason".to_string(), format!("{reason:?}"));
        metadata.insert("evidence_count".to_string(), evidence_entry_ids.len().to_string());

        self.commit(CommitEventRequest {
            event_type: EventType::DisputeOpened,
            severity: Some(Severity::Warn),
            subject_id: raised_by_subject_id,
            passport_id: None,
            institution_id: None,
            target_id: Some(job_id.to_string()),
            target_type: Some("job".to_string()),
            metadata,
            ip_hash,
            region: None,
        })
        .await?;

        let dispute = Dispute {
            dispute_id: Uuid::new_v4(),
            job_id,
            raised_by_subject_id,
            reason,
            status: DisputeStatus::Open,
            outcome: None,
            refund_usd: None,
            evidence_entry_ids,
            opened_at: Utc::now(),
            resolved_at: None,
        };
        self.dispute_store.upsert(dispute.clone()).await?;
        Ok(dispute)
    }

    /// Writes a `DISPUTE_RESOLVED` entry, and a `REFUND_ISSUED` entry
    /// when a refund is granted, then updates the dispute record.
    #[instrument(skip(self))]
    pub async fn resolve_dispute(
        &self,
        dispute_id: Uuid,
        resolved_by: Uuid,
        outcome: String,
        refund_usd: Option<f64>,
        ip_hash: String,
    ) -> Result<Dispute, ObsidianError> {
        let mut dispute = self
            .dispute_store
            .get(dispute_id)
            .await?
            .ok_or_else(|| ObsidianError::NotFound(format!("dispute {dispute_id}")))?;

        let mut metadata = BTreeMap::new();
        metadata.insert("outcome".to_string(), outcome.clone());

        self.commit(CommitEventRequest {
            event_type: EventType::DisputeResolved,
            severity: Some(Severity::Info),
            subject_id: resolved_by,
            passport_id: None,
            institution_id: None,
            target_id: Some(dispute_id.to_string()),
            target_type: Some("dispute".to_string()),
            metadata,
            ip_hash: ip_hash.clone(),
            region: None,
        })
        .await?;

        if let Some(amount) = refund_usd {
            let mut refund_metadata = BTreeMap::new();
            refund_metadata.insert("amount_usd".to_string(), amount.to_string());
            self.commit(CommitEventRequest {
                event_type: EventType::RefundIssued,
                severity: Some(Severity::Info),
                subject_id: resolved_by,
                passport_id: None,
                institution_id: None,
                target_id: Some(dispute.job_id.to_string()),
                target_type: Some("job".to_string()),
                metadata: refund_metadata,
                ip_hash,
                region: None,
            })
            .await?;
        }

        dispute.status = DisputeStatus::Resolved;
        dispute.outcome = Some(outcome);
        dispute.refund_usd = refund_usd;
        dispute.resolved_at = Some(Utc::now());
        self.dispute_store.upsert(dispute.clone()).await?;
        Ok(dispute)
    }
}

fn to_chain_link(entry: &LedgerEntry) -> ChainLink {
    ChainLink {
        block_index: entry.block_index,
        prev_hash: entry.prev_hash.clone(),
        block_hash: entry.block_hash.clone(),
        canonical: entry.to_canonical(),
    }
}

fn filter_hash(filter: &LedgerQueryFilter) -> String {
    let repr = format!("{filter:?}");
    let mut hasher = Sha256::new();
    hasher.update(repr.as_bytes());
    hex::encode(hasher.finalize())
}
