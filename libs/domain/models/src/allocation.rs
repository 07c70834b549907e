// [libs/domain/models/src/allocation.rs]
//! A time-bounded reservation of a GPU for a job — Atlas's routing
//! output and the unit Obsidian's dispute machinery keys off of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AllocationStatus {
    Reserved,
    Active,
    Completed,
    Cancelled,
    Expired,
    Failed,
}

impl AllocationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AllocationStatus::Completed
                | AllocationStatus::Cancelled
                | AllocationStatus::Expired
                | AllocationStatus::Failed
        )
    }

    pub fn is_releasable(&self) -> bool {
        matches!(self, AllocationStatus::Reserved | AllocationStatus::Active)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    pub allocation_id: Uuid,
    pub job_id: Uuid,
    pub subject_id: Uuid,
    pub gpu_id: Uuid,
    pub node_id: Uuid,
    pub vram_reserved_gb: f64,
    pub power_cap_watts: u32,
    pub max_duration_hours: f64,
    pub workload_type: String,
    pub price_per_hour_usd: f64,
    pub reserved_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub released_at: Option<DateTime<Utc>>,
    pub status: AllocationStatus,
}

impl Allocation {
    pub fn is_hard_expired(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && now > self.expires_at
    }

    pub fn duration_hours(&self) -> f64 {
        let end = self.released_at.unwrap_or_else(Utc::now);
        (end - self.reserved_at).num_seconds() as f64 / 3600.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoutingStrategy {
    Cheapest,
    Fastest,
    HighestTrust,
    Institutional,
    Balanced,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryCriteria {
    pub min_vram_gb: f64,
    pub gpu_tiers: Option<Vec<String>>,
    pub require_nvlink: bool,
    pub min_benchmark_score: Option<f64>,
    pub min_node_trust: Option<u8>,
    pub max_price_per_hour: Option<f64>,
    pub workload_type: String,
    pub preferred_institution_id: Option<Uuid>,
    pub preferred_campus_id: Option<Uuid>,
    pub preferred_regions: Option<Vec<String>>,
    pub preferred_tiers: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub gpu_id: Uuid,
    pub node_id: Uuid,
    pub score: u32,
    pub price_per_hour_usd: f64,
    pub node_trust_score: u8,
    pub estimated_wait_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub allocation: Allocation,
    pub candidate: ScoredCandidate,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FinalAllocationStatus {
    Completed,
    Cancelled,
    Failed,
}

impl From<FinalAllocationStatus> for AllocationStatus {
    fn from(value: FinalAllocationStatus) -> Self {
        match value {
            FinalAllocationStatus::Completed => AllocationStatus::Completed,
            FinalAllocationStatus::Cancelled => AllocationStatus::Cancelled,
            FinalAllocationStatus::Failed => AllocationStatus::Failed,
        }
    }
}
