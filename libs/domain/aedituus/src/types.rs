// [libs/domain/aedituus/src/types.rs]
//! The authorize request/response envelope — kept local to Aedituus
//! rather than the shared model crate since no other pillar reads or
//! writes this shape directly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use custodes_domain_models::{
    ActionType, ClearanceLevel, Decision, DenyReason, ResourceConstraints, StepUpMethod,
    SubjectType,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceAttributes {
    pub vram_gb: Option<f64>,
    pub gpu_count: Option<u32>,
    pub gpu_tier: Option<String>,
    pub duration_hours: Option<f64>,
    pub workload_type: Option<String>,
    pub region: Option<String>,
    pub campus_id: Option<Uuid>,
    pub estimated_cost: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskContext {
    pub current_risk_score: Option<u8>,
    pub concurrent_jobs: Option<u32>,
    pub monthly_spend: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationRequest {
    pub subject_id: Uuid,
    pub clearance_level: ClearanceLevel,
    pub trust_score: u8,
    pub subject_type: SubjectType,
    pub institution_id: Option<Uuid>,
    pub org_id: Option<Uuid>,
    pub passport_id: Option<Uuid>,
    pub action: ActionType,
    pub resource: ResourceAttributes,
    pub risk: RiskContext,
    pub ip_hash: String,
    pub request_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub decision: Decision,
    pub deny_reason: Option<DenyReason>,
    pub constraints: Option<ResourceConstraints>,
    pub step_up_method: Option<StepUpMethod>,
    pub retry_after_seconds: Option<u64>,
    pub matched_rule_id: Option<Uuid>,
    pub policy_id: Option<Uuid>,
    pub policy_version: Option<u32>,
    pub evaluation_id: Uuid,
    pub evaluated_at: DateTime<Utc>,
    pub reason_message: String,
}
