// [libs/domain/aedituus/src/templates.rs]
/*!
 * APARATO: DEFAULT POLICY TEMPLATES
 * CLASIFICACIÓN: SEED DATA (ESTRATO L2)
 * RESPONSABILIDAD: BASELINE Y PLANTILLA UNIVERSITARIA DE POLÍTICA
 *
 * Constructors only — callers decide whether and when to persist these
 * through a `PolicyStore`. Priorities are spaced by ten so an operator
 * can splice a custom rule between two defaults without renumbering.
 */

use chrono::Weekday;
use uuid::Uuid;

use custodes_domain_models::{
    ActionType, BlackoutWindow, ClearanceLevel, Decision, Policy, PolicyScope, ResourceConstraints,
    Rule, RuleConditions, StepUpMethod, TimeWindow,
};

const ADMIN_ACTIONS: [ActionType; 4] =
    [ActionType::PolicyUpdate, ActionType::SubjectBan, ActionType::InstitutionManage, ActionType::DisputeResolve];

const ALL_ACTIONS: [ActionType; 17] = [
    ActionType::JobSubmit,
    ActionType::JobCancel,
    ActionType::GpuAllocate,
    ActionType::GpuPreempt,
    ActionType::DataRead,
    ActionType::DataWrite,
    ActionType::DataTrain,
    ActionType::DataExport,
    ActionType::BenchmarkRun,
    ActionType::TunnelOpen,
    ActionType::MarketplaceList,
    ActionType::PolicyUpdate,
    ActionType::SubjectBan,
    ActionType::InstitutionManage,
    ActionType::DisputeResolve,
    ActionType::PayoutRequest,
    ActionType::RefundIssue,
};

/// Compute-bearing actions a RESTRICTED/STANDARD/TRUSTED band is
/// allowed, as opposed to admin/financial actions gated separately.
const COMPUTE_ACTIONS: [ActionType; 8] = [
    ActionType::JobSubmit,
    ActionType::JobCancel,
    ActionType::GpuAllocate,
    ActionType::GpuPreempt,
    ActionType::DataRead,
    ActionType::DataWrite,
    ActionType::DataTrain,
    ActionType::BenchmarkRun,
];

fn inference_only_constraints() -> ResourceConstraints {
    ResourceConstraints {
        max_vram_gb: Some(8.0),
        max_gpus: Some(1),
        max_duration_hours: Some(2.0),
        max_power_watts: Some(150),
        allowed_gpu_tiers: None,
        allowed_regions: None,
        network_restricted: true,
        bandwidth_cap_mbps: None,
        max_spend_per_job: None,
        max_concurrent_jobs: Some(1),
        require_audit_logging: true,
        workload_types_allowed: Some(vec!["inference".to_string()]),
    }
}

fn standard_constraints() -> ResourceConstraints {
    ResourceConstraints { max_vram_gb: Some(24.0), max_gpus: Some(2), max_duration_hours: Some(24.0), ..ResourceConstraints::default() }
}

fn trusted_constraints() -> ResourceConstraints {
    ResourceConstraints { max_vram_gb: Some(80.0), max_gpus: Some(4), max_duration_hours: Some(72.0), ..ResourceConstraints::default() }
}

/// The platform-wide baseline: admin gate, payout gate, risk step-up,
/// then trust bands ordered from HIGH_CLEARANCE down to RESTRICTED so
/// the first (highest) band whose floor the subject clears wins.
pub fn platform_baseline_policy() -> Policy {
    let rules = vec![
        Rule {
            id: Uuid::new_v4(),
            description: "admin actions require ADMIN clearance".to_string(),
            priority: 10,
            action_types: ADMIN_ACTIONS.to_vec(),
            conditions: RuleConditions { min_clearance: Some(ClearanceLevel::Admin), ..RuleConditions::default() },
            decision: Decision::Allow,
            resource_constraints: None,
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "payout requests require trust >= 61".to_string(),
            priority: 20,
            action_types: vec![ActionType::PayoutRequest],
            conditions: RuleConditions { min_trust_score: Some(61), ..RuleConditions::default() },
            decision: Decision::Allow,
            resource_constraints: None,
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "Tutela risk above 70 requires MFA step-up".to_string(),
            priority: 30,
            action_types: ALL_ACTIONS.to_vec(),
            conditions: RuleConditions { min_risk_score: Some(71), ..RuleConditions::default() },
            decision: Decision::StepUp,
            resource_constraints: None,
            deny_reason: None,
            step_up_method: Some(StepUpMethod::MfaReauth),
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "HIGH_CLEARANCE institutional subjects allowed without limits".to_string(),
            priority: 40,
            action_types: COMPUTE_ACTIONS.to_vec(),
            conditions: RuleConditions {
                min_trust_score: Some(81),
                min_clearance: Some(ClearanceLevel::Institutional),
                ..RuleConditions::default()
            },
            decision: Decision::Allow,
            resource_constraints: None,
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "TRUSTED band (61-80) allowed up to 80GB/4 GPUs/72h".to_string(),
            priority: 50,
            action_types: COMPUTE_ACTIONS.to_vec(),
            conditions: RuleConditions { min_trust_score: Some(61), ..RuleConditions::default() },
            decision: Decision::AllowLimited,
            resource_constraints: Some(trusted_constraints()),
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "STANDARD band (31-60) allowed up to 24GB/2 GPUs/24h".to_string(),
            priority: 60,
            action_types: COMPUTE_ACTIONS.to_vec(),
            conditions: RuleConditions { min_trust_score: Some(31), ..RuleConditions::default() },
            decision: Decision::AllowLimited,
            resource_constraints: Some(standard_constraints()),
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "RESTRICTED band (<31) limited to inference-only, network-restricted".to_string(),
            priority: 70,
            action_types: COMPUTE_ACTIONS.to_vec(),
            conditions: RuleConditions { min_trust_score: Some(0), ..RuleConditions::default() },
            decision: Decision::AllowLimited,
            resource_constraints: Some(inference_only_constraints()),
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
    ];

    Policy { id: Uuid::new_v4(), scope: PolicyScope::Platform, scope_id: None, version: 1, rules, default_decision: Decision::Deny }
}

/// Per-institution overlay: blackout windows deny heavy compute, and
/// students are halved during business hours.
pub fn university_template_policy(institution_id: Uuid, blackout_windows: Vec<BlackoutWindow>) -> Policy {
    let business_hours = TimeWindow { start_hour: 9, end_hour: 17 };
    let weekdays = vec![Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri];

    let rules = vec![
        Rule {
            id: Uuid::new_v4(),
            description: "institutional blackout windows deny heavy compute".to_string(),
            priority: 10,
            action_types: COMPUTE_ACTIONS.to_vec(),
            conditions: RuleConditions { blackout_windows: Some(blackout_windows), ..RuleConditions::default() },
            decision: Decision::Deny,
            resource_constraints: None,
            deny_reason: Some(custodes_domain_models::DenyReason::BlackoutWindow),
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "students get half limits during business hours".to_string(),
            priority: 20,
            action_types: COMPUTE_ACTIONS.to_vec(),
            conditions: RuleConditions {
                allowed_subject_types: Some(vec![custodes_domain_models::SubjectType::Student]),
                allowed_days_of_week: Some(weekdays),
                time_windows: Some(vec![business_hours]),
                ..RuleConditions::default()
            },
            decision: Decision::AllowLimited,
            resource_constraints: Some(ResourceConstraints {
                max_vram_gb: Some(12.0),
                max_gpus: Some(1),
                max_duration_hours: Some(12.0),
                ..ResourceConstraints::default()
            }),
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "students get full allocation off-hours".to_string(),
            priority: 30,
            action_types: COMPUTE_ACTIONS.to_vec(),
            conditions: RuleConditions {
                allowed_subject_types: Some(vec![custodes_domain_models::SubjectType::Student]),
                ..RuleConditions::default()
            },
            decision: Decision::AllowLimited,
            resource_constraints: Some(standard_constraints()),
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
        Rule {
            id: Uuid::new_v4(),
            description: "faculty and researchers get full institutional allocation".to_string(),
            priority: 40,
            action_types: COMPUTE_ACTIONS.to_vec(),
            conditions: RuleConditions {
                allowed_subject_types: Some(vec![custodes_domain_models::SubjectType::Faculty, custodes_domain_models::SubjectType::Researcher]),
                ..RuleConditions::default()
            },
            decision: Decision::Allow,
            resource_constraints: None,
            deny_reason: None,
            step_up_method: None,
            is_active: true,
            expires_at: None,
        },
    ];

    Policy { id: Uuid::new_v4(), scope: PolicyScope::Institution, scope_id: Some(institution_id), version: 1, rules, default_decision: Decision::Deny }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_baseline_sorts_admin_gate_before_trust_bands() {
        let policy = platform_baseline_policy();
        let sorted = policy.sorted_rules();
        assert_eq!(sorted.first().unwrap().priority, 10);
        assert!(sorted.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn university_template_scopes_to_the_institution() {
        let institution_id = Uuid::new_v4();
        let policy = university_template_policy(institution_id, Vec::new());
        assert_eq!(policy.scope, PolicyScope::Institution);
        assert_eq!(policy.scope_id, Some(institution_id));
    }
}
