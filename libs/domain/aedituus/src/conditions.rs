// [libs/domain/aedituus/src/conditions.rs]
/*!
 * APARATO: CONDITION EVALUATION
 * CLASIFICACIÓN: PURE DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: EVALUACIÓN ATÓMICA DE CONDICIONES DE REGLA
 *
 * Every predicate here is atomic and side-effect free: a rule matches
 * only when every populated condition holds against the request.
 */

use custodes_domain_models::RuleConditions;

use crate::types::AuthorizationRequest;

pub fn rule_matches(conditions: &RuleConditions, request: &AuthorizationRequest) -> bool {
    subject_conditions_hold(conditions, request)
        && resource_conditions_hold(conditions, request)
        && financial_conditions_hold(conditions, request)
        && risk_conditions_hold(conditions, request)
        && time_conditions_hold(conditions, request)
}

fn subject_conditions_hold(conditions: &RuleConditions, request: &AuthorizationRequest) -> bool {
    if let Some(min_clearance) = conditions.min_clearance {
        if request.clearance_level < min_clearance {
            return false;
        }
    }
    if let Some(min_trust) = conditions.min_trust_score {
        if request.trust_score < min_trust {
            return false;
        }
    }
    if let Some(allowed) = &conditions.allowed_subject_types {
        if !allowed.contains(&request.subject_type) {
            return false;
        }
    }
    if let Some(ids) = &conditions.institution_ids {
        match request.institution_id {
            Some(id) if ids.contains(&id) => {}
            _ => return false,
        }
    }
    if let Some(ids) = &conditions.org_ids {
        match request.org_id {
            Some(id) if ids.contains(&id) => {}
            _ => return false,
        }
    }
    if let Some(ids) = &conditions.subject_ids {
        if !ids.contains(&request.subject_id) {
            return false;
        }
    }
    true
}

fn resource_conditions_hold(conditions: &RuleConditions, request: &AuthorizationRequest) -> bool {
    let resource = &request.resource;

    if let Some(min_vram) = conditions.min_vram_gb {
        if resource.vram_gb.map(|v| v < min_vram).unwrap_or(false) {
            return false;
        }
    }
    if let Some(max_vram) = conditions.max_vram_gb {
        if resource.vram_gb.map(|v| v > max_vram).unwrap_or(false) {
            return false;
        }
    }
    if let Some(tiers) = &conditions.allowed_gpu_tiers {
        if let Some(tier) = &resource.gpu_tier {
            if !tiers.iter().any(|t| t == tier) {
                return false;
            }
        }
    }
    if let Some(regions) = &conditions.allowed_regions {
        if let Some(region) = &resource.region {
            if !regions.iter().any(|r| r == region) {
                return false;
            }
        }
    }
    if let Some(campuses) = &conditions.allowed_campus_ids {
        match resource.campus_id {
            Some(id) if campuses.contains(&id) => {}
            Some(_) => return false,
            None => {}
        }
    }
    if let Some(max_count) = conditions.max_gpu_count {
        if resource.gpu_count.map(|c| c > max_count).unwrap_or(false) {
            return false;
        }
    }
    if let Some(max_hours) = conditions.max_duration_hours {
        if resource.duration_hours.map(|h| h > max_hours).unwrap_or(false) {
            return false;
        }
    }
    if let Some(workloads) = &conditions.allowed_workload_types {
        if let Some(workload) = &resource.workload_type {
            if !workloads.iter().any(|w| w == workload) {
                return false;
            }
        }
    }
    true
}

fn financial_conditions_hold(conditions: &RuleConditions, request: &AuthorizationRequest) -> bool {
    if let Some(max_per_hour) = conditions.max_spend_per_hour {
        if request.resource.estimated_cost.map(|c| c > max_per_hour).unwrap_or(false) {
            return false;
        }
    }
    if let Some(max_per_month) = conditions.max_spend_per_month {
        if request.risk.monthly_spend.map(|s| s > max_per_month).unwrap_or(false) {
            return false;
        }
    }
    true
}

fn risk_conditions_hold(conditions: &RuleConditions, request: &AuthorizationRequest) -> bool {
    if let Some(max_risk) = conditions.max_risk_score {
        if request.risk.current_risk_score.map(|r| r > max_risk).unwrap_or(false) {
            return false;
        }
    }
    if let Some(min_risk) = conditions.min_risk_score {
        if request.risk.current_risk_score.map(|r| r < min_risk).unwrap_or(true) {
            return false;
        }
    }
    true
}

fn time_conditions_hold(conditions: &RuleConditions, request: &AuthorizationRequest) -> bool {
    use chrono::Datelike;
    use chrono::Timelike;

    if let Some(days) = &conditions.allowed_days_of_week {
        if !days.contains(&request.request_time.weekday()) {
            return false;
        }
    }
    if let Some(windows) = &conditions.time_windows {
        let hour = request.request_time.hour() as u8;
        if !windows.iter().any(|w| w.contains_hour(hour)) {
            return false;
        }
    }
    if let Some(blackouts) = &conditions.blackout_windows {
        for blackout in blackouts {
            if !blackout.applies_to(request.institution_id) {
                continue;
            }
            let in_window = request.request_time >= blackout.starts_at && request.request_time < blackout.ends_at;
            let vram_applies = blackout.min_vram_gb.map(|min| request.resource.vram_gb.map(|v| v >= min).unwrap_or(false)).unwrap_or(true);
            if in_window && vram_applies {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use custodes_domain_models::{ActionType, ClearanceLevel, SubjectType, TimeWindow};
    use uuid::Uuid;

    fn base_request() -> AuthorizationRequest {
        AuthorizationRequest {
            subject_id: Uuid::new_v4(),
            clearance_level: ClearanceLevel::Institutional,
            trust_score: 70,
            subject_type: SubjectType::Researcher,
            institution_id: None,
            org_id: None,
            passport_id: None,
            action: ActionType::JobSubmit,
            resource: crate::types::ResourceAttributes {
                vram_gb: Some(16.0),
                gpu_count: Some(1),
                gpu_tier: None,
                duration_hours: Some(4.0),
                workload_type: None,
                region: None,
                campus_id: None,
                estimated_cost: Some(2.0),
            },
            risk: crate::types::RiskContext { current_risk_score: Some(10), concurrent_jobs: Some(1), monthly_spend: Some(50.0) },
            ip_hash: "iphash".to_string(),
            request_time: Utc.with_ymd_and_hms(2026, 3, 4, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn clearance_floor_rejects_lower_clearance() {
        let mut conditions = RuleConditions::default();
        conditions.min_clearance = Some(ClearanceLevel::Enterprise);
        assert!(!rule_matches(&conditions, &base_request()));
    }

    #[test]
    fn vram_range_rejects_out_of_bounds_request() {
        let mut conditions = RuleConditions::default();
        conditions.max_vram_gb = Some(8.0);
        assert!(!rule_matches(&conditions, &base_request()));
    }

    #[test]
    fn overnight_time_window_wraps_past_midnight() {
        let window = TimeWindow { start_hour: 22, end_hour: 6 };
        assert!(window.contains_hour(23));
        assert!(window.contains_hour(2));
        assert!(!window.contains_hour(12));
    }

    #[test]
    fn institution_scoped_blackout_blocks_heavy_compute() {
        let institution_id = Uuid::new_v4();
        let mut request = base_request();
        request.institution_id = Some(institution_id);
        request.request_time = Utc.with_ymd_and_hms(2026, 3, 4, 10, 0, 0).unwrap();

        let mut conditions = RuleConditions::default();
        conditions.blackout_windows = Some(vec![custodes_domain_models::BlackoutWindow {
            institution_id: Some(institution_id),
            starts_at: Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap(),
            ends_at: Utc.with_ymd_and_hms(2026, 3, 4, 17, 0, 0).unwrap(),
            min_vram_gb: Some(8.0),
        }]);
        assert!(!rule_matches(&conditions, &request));
    }
}
