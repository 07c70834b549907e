// [libs/domain/models/src/policy.rs]
//! Layered, scoped policy and rule types — the shape Aedituus evaluates.
//! This module only carries data; matching semantics live in
//! `custodes-aedituus`.

use chrono::{DateTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::action::ActionType;
use crate::subject::{ClearanceLevel, SubjectType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyScope {
    Subject,
    Institution,
    Org,
    Platform,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Allow,
    AllowLimited,
    Deny,
    DenyCooldown,
    StepUp,
    Review,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DenyReason {
    InsufficientClearance,
    InsufficientTrust,
    ResourceConstraintViolated,
    FinancialLimitExceeded,
    RiskTooHigh,
    TimeWindowBlocked,
    BlackoutWindow,
    RateLimitExceeded,
    PolicyNotFound,
    NoMatchingRule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeWindow {
    /// UTC hour, `[start, end)`; `start > end` means an overnight window.
    pub start_hour: u8,
    pub end_hour: u8,
}

impl TimeWindow {
    pub fn contains_hour(&self, hour: u8) -> bool {
        if self.start_hour <= self.end_hour {
            hour >= self.start_hour && hour < self.end_hour
        } else {
            hour >= self.start_hour || hour < self.end_hour
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlackoutWindow {
    pub institution_id: Option<Uuid>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    /// Blackout only applies to resource requests at/above this VRAM.
    pub min_vram_gb: Option<f64>,
}

impl BlackoutWindow {
    pub fn applies_to(&self, institution_id: Option<Uuid>) -> bool {
        self.institution_id.is_none() || self.institution_id == institution_id
    }
}

/// Atomic predicates over the authorize request; all present conditions
/// on a rule must hold for the rule to match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleConditions {
    pub min_clearance: Option<ClearanceLevel>,
    pub min_trust_score: Option<u8>,
    pub allowed_subject_types: Option<Vec<SubjectType>>,
    pub institution_ids: Option<Vec<Uuid>>,
    pub org_ids: Option<Vec<Uuid>>,
    pub subject_ids: Option<Vec<Uuid>>,

    pub min_vram_gb: Option<f64>,
    pub max_vram_gb: Option<f64>,
    pub allowed_gpu_tiers: Option<Vec<String>>,
    pub allowed_regions: Option<Vec<String>>,
    pub allowed_campus_ids: Option<Vec<Uuid>>,
    pub max_gpu_count: Option<u32>,
    pub max_duration_hours: Option<f64>,
    pub allowed_workload_types: Option<Vec<String>>,

    pub max_spend_per_hour: Option<f64>,
    pub max_spend_per_month: Option<f64>,

    pub max_risk_score: Option<u8>,
    /// Trigger floor for step-up/review rules: matches when the
    /// request's current risk score is at or above this value.
    pub min_risk_score: Option<u8>,

    pub allowed_days_of_week: Option<Vec<Weekday>>,
    pub time_windows: Option<Vec<TimeWindow>>,
    pub blackout_windows: Option<Vec<BlackoutWindow>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceConstraints {
    pub max_vram_gb: Option<f64>,
    pub max_gpus: Option<u32>,
    pub max_duration_hours: Option<f64>,
    pub max_power_watts: Option<u32>,
    pub allowed_gpu_tiers: Option<Vec<String>>,
    pub allowed_regions: Option<Vec<String>>,
    pub network_restricted: bool,
    pub bandwidth_cap_mbps: Option<u32>,
    pub max_spend_per_job: Option<f64>,
    pub max_concurrent_jobs: Option<u32>,
    pub require_audit_logging: bool,
    pub workload_types_allowed: Option<Vec<String>>,
}

impl Default for ResourceConstraints {
    fn default() -> Self {
        Self {
            max_vram_gb: None,
            max_gpus: None,
            max_duration_hours: None,
            max_power_watts: None,
            allowed_gpu_tiers: None,
            allowed_regions: None,
            network_restricted: false,
            bandwidth_cap_mbps: None,
            max_spend_per_job: None,
            max_concurrent_jobs: None,
            require_audit_logging: false,
            workload_types_allowed: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepUpMethod {
    MfaReauth,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: Uuid,
    pub description: String,
    /// Lower sorts first.
    pub priority: i32,
    pub action_types: Vec<ActionType>,
    pub conditions: RuleConditions,
    pub decision: Decision,
    pub resource_constraints: Option<ResourceConstraints>,
    pub deny_reason: Option<DenyReason>,
    pub step_up_method: Option<StepUpMethod>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Rule {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map(|exp| now < exp).unwrap_or(true)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub id: Uuid,
    pub scope: PolicyScope,
    /// The entity this policy is scoped to: subject/institution/org id,
    /// or `None` for the platform-wide policy.
    pub scope_id: Option<Uuid>,
    pub version: u32,
    pub rules: Vec<Rule>,
    pub default_decision: Decision,
}

impl Policy {
    /// Rules sorted deterministically by `(priority asc, stable id)`.
    pub fn sorted_rules(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.id.cmp(&b.id)));
        rules
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateLimitScope {
    Subject,
    Institution,
    Ip,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub window_seconds: u64,
    pub max_requests: u64,
    pub scope: RateLimitScope,
}
