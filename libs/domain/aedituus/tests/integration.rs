// [libs/domain/aedituus/tests/integration.rs]
//! Exercises Aedituus against the real in-memory policy/rate-limit
//! stores and Obsidian sink from `custodes-infra-store`, covering the
//! baseline-authorize and rate-limit-lockout testable properties.

use std::sync::Arc;

use chrono::Utc;
use custodes_aedituus::config::PolicyConfig;
use custodes_aedituus::{Aedituus, AuthorizationRequest, ResourceAttributes, RiskContext};
use custodes_domain_models::{
    ActionType, ClearanceLevel, Decision, DenyReason, Policy, PolicyScope, RateLimitConfig, RateLimitScope, SubjectType,
};
use custodes_infra_store::aedituus::{AedituusLedgerSink, MemPolicyStore, MemRateLimitStore};
use custodes_infra_store::obsidian::{MemDisputeStore, MemLedger, MemLedgerAppendStore, MemMerkleBlockStore, MemSequenceCounter};
use custodes_obsidian::config::LedgerConfig;
use uuid::Uuid;

fn new_ledger() -> Arc<MemLedger> {
    Arc::new(MemLedger::new(
        Arc::new(MemLedgerAppendStore::default()),
        Arc::new(MemSequenceCounter::default()),
        Arc::new(MemMerkleBlockStore::default()),
        Arc::new(MemDisputeStore::default()),
        LedgerConfig::default(),
    ))
}

fn request(subject_id: Uuid, trust_score: u8) -> AuthorizationRequest {
    AuthorizationRequest {
        subject_id,
        clearance_level: ClearanceLevel::Institutional,
        trust_score,
        subject_type: SubjectType::Researcher,
        institution_id: None,
        org_id: None,
        passport_id: None,
        action: ActionType::JobSubmit,
        resource: ResourceAttributes {
            vram_gb: Some(24.0),
            gpu_count: Some(2),
            gpu_tier: None,
            duration_hours: Some(8.0),
            workload_type: None,
            region: None,
            campus_id: None,
            estimated_cost: Some(3.0),
        },
        risk: RiskContext { current_risk_score: Some(10), concurrent_jobs: Some(0), monthly_spend: Some(0.0) },
        ip_hash: "iphash".to_string(),
        request_time: Utc::now(),
    }
}

#[tokio::test]
async fn trust_85_subject_is_allowed_under_the_baseline_platform_policy() {
    let policies = Arc::new(MemPolicyStore::default());
    policies
        .upsert(Policy {
            id: Uuid::new_v4(),
            scope: PolicyScope::Platform,
            scope_id: None,
            version: 1,
            rules: custodes_aedituus::templates::platform_baseline_policy().rules,
            default_decision: Decision::Deny,
        })
        .await;

    let aedituus = Aedituus::new(
        policies,
        Arc::new(MemRateLimitStore::default()),
        Arc::new(AedituusLedgerSink::new(new_ledger())),
        PolicyConfig::default(),
    );

    let response = aedituus.authorize(request(Uuid::new_v4(), 85)).await.unwrap();
    assert!(
        matches!(response.decision, Decision::Allow | Decision::AllowLimited),
        "a trust=85, INSTITUTIONAL clearance JOB_SUBMIT must clear the baseline policy, got {:?}",
        response.decision
    );
}

#[tokio::test]
async fn hundred_and_first_job_submit_in_the_window_is_denied_for_cooldown() {
    let policies = Arc::new(MemPolicyStore::default());
    policies
        .upsert(Policy {
            id: Uuid::new_v4(),
            scope: PolicyScope::Platform,
            scope_id: None,
            version: 1,
            rules: custodes_aedituus::templates::platform_baseline_policy().rules,
            default_decision: Decision::Deny,
        })
        .await;

    let config = PolicyConfig {
        rate_limit_configs: vec![RateLimitConfig { window_seconds: 60, max_requests: 100, scope: RateLimitScope::Subject }],
        ..PolicyConfig::default()
    };
    let aedituus = Aedituus::new(policies, Arc::new(MemRateLimitStore::default()), Arc::new(AedituusLedgerSink::new(new_ledger())), config);

    let subject_id = Uuid::new_v4();
    for _ in 0..100 {
        let response = aedituus.authorize(request(subject_id, 70)).await.unwrap();
        assert_ne!(response.decision, Decision::DenyCooldown);
    }

    let locked_out = aedituus.authorize(request(subject_id, 70)).await.unwrap();
    assert_eq!(locked_out.decision, Decision::DenyCooldown);
    assert_eq!(locked_out.deny_reason, Some(DenyReason::RateLimitExceeded));
    let retry_after = locked_out.retry_after_seconds.unwrap();
    assert!(retry_after > 0 && retry_after <= 60);
}
