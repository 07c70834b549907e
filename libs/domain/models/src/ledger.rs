// [libs/domain/models/src/ledger.rs]
//! Obsidian's append-only record shapes: entries, Merkle sealing blocks,
//! and the severity/event vocabulary.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use custodes_core_hashchain::CanonicalEntry;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warn,
    Security,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    PassportIssued,
    PassportRevoked,
    SubjectBanned,
    AuthFailed,
    PolicyDeny,
    PolicyAllow,
    JobSubmitted,
    JobFailed,
    JobCompleted,
    GpuRegistered,
    NodeRegistered,
    NodeOffline,
    NodeVeritasVerified,
    AllocationCreated,
    AllocationReleased,
    AllocationExpired,
    AnomalyDetected,
    KillSwitchFired,
    ClearanceRevoked,
    DisputeOpened,
    DisputeResolved,
    RefundIssued,
    BenchmarkFailed,
}

impl EventType {
    /// Security-class events (bans, anomalies, threats, kill-switch,
    /// clearance-revocation) default to SECURITY; failure-class
    /// (auth-failed, policy-deny, job-failed, dispute-opened,
    /// benchmark-failed) default to WARN; everything else defaults to
    /// INFO.
    pub fn default_severity(&self) -> Severity {
        match self {
            EventType::SubjectBanned
            | EventType::AnomalyDetected
            | EventType::KillSwitchFired
            | EventType::ClearanceRevoked => Severity::Security,

            EventType::AuthFailed
            | EventType::PolicyDeny
            | EventType::JobFailed
            | EventType::DisputeOpened
            | EventType::BenchmarkFailed => Severity::Warn,

            _ => Severity::Info,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: Uuid,
    pub block_index: u64,
    pub event_type: EventType,
    pub severity: Severity,
    pub subject_id: Uuid,
    pub passport_id: Option<Uuid>,
    pub institution_id: Option<Uuid>,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
    /// SHA-256(ip) — the raw address is never stored.
    pub ip_hash: String,
    pub region: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub sequence: u64,
    pub prev_hash: String,
    pub payload_hash: String,
    pub block_hash: String,
    pub merkle_root: Option<String>,
}

impl LedgerEntry {
    /// Projects the hash-relevant fields for the core chaining functions.
    pub fn to_canonical(&self) -> CanonicalEntry {
        CanonicalEntry {
            entry_id: self.entry_id.to_string(),
            block_index: self.block_index,
            event_type: format!("{:?}", self.event_type),
            severity: format!("{:?}", self.severity),
            subject_id: self.subject_id.to_string(),
            passport_id: self.passport_id.map(|id| id.to_string()),
            institution_id: self.institution_id.map(|id| id.to_string()),
            target_id: self.target_id.clone(),
            target_type: self.target_type.clone(),
            metadata: self.metadata.clone().into_iter().collect(),
            ip_hash: self.ip_hash.clone(),
            region: self.region.clone(),
            timestamp: self.timestamp.to_rfc3339(),
            sequence: self.sequence,
        }
    }
}

/// A request to commit a new event; the ledger fills in every hash and
/// linkage field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitEventRequest {
    pub event_type: EventType,
    pub severity: Option<Severity>,
    pub subject_id: Uuid,
    pub passport_id: Option<Uuid>,
    pub institution_id: Option<Uuid>,
    pub target_id: Option<String>,
    pub target_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub ip_hash: String,
    pub region: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitResult {
    pub entry_id: Uuid,
    pub block_index: u64,
    pub block_hash: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerkleBlock {
    pub block_number: u64,
    pub entry_start: u64,
    pub entry_end: u64,
    pub leaves: Vec<String>,
    pub merkle_root: String,
    pub sealed_at: DateTime<Utc>,
    pub sealed_by: String,
    pub signature: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerQueryFilter {
    pub subject_id: Option<Uuid>,
    pub target_id: Option<String>,
    pub event_types: Option<Vec<EventType>>,
    pub min_severity: Option<Severity>,
    pub institution_id: Option<Uuid>,
    pub from_time: Option<DateTime<Utc>>,
    pub to_time: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerQueryResult {
    pub entries: Vec<LedgerEntry>,
    pub total: u64,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub query_hash: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceSubjectKind {
    Job,
    Dispute,
    Incident,
    Subject,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidencePackage {
    pub package_id: Uuid,
    pub kind: EvidenceSubjectKind,
    pub subject_ref: String,
    pub entry_ids: Vec<Uuid>,
    pub merkle_root: String,
    pub proofs: Vec<Vec<custodes_core_hashchain::ProofStep>>,
    pub generated_at: DateTime<Utc>,
    pub signature: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainVerificationReport {
    pub valid: bool,
    pub first_invalid_block: Option<u64>,
    pub entries_checked: u64,
    pub error: Option<String>,
}
