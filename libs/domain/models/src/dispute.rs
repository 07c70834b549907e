// [libs/domain/models/src/dispute.rs]
//! Job/billing disputes resolved via the Obsidian ledger's dispute API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeReason {
    Underperformance,
    HostFault,
    Abuse,
    Unauthorized,
    Billing,
    Breach,
    Sla,
    Fraud,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisputeStatus {
    Open,
    Evidence,
    Reviewing,
    Resolved,
    Escalated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dispute {
    pub dispute_id: Uuid,
    pub job_id: Uuid,
    pub raised_by_subject_id: Uuid,
    pub reason: DisputeReason,
    pub status: DisputeStatus,
    pub outcome: Option<String>,
    pub refund_usd: Option<f64>,
    pub evidence_entry_ids: Vec<Uuid>,
    pub opened_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}
