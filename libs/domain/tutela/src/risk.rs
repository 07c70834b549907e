// [libs/domain/tutela/src/risk.rs]
/*!
 * APARATO: COMPOSITE RISK SCORING
 * CLASIFICACIÓN: PURE DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: AGREGACIÓN PONDERADA DE SEÑALES EN UN SCORE 0-100
 *
 * Each dimension is scored 0-100 independently from the rolling signal
 * window, then combined with fixed weights. `window` is expected newest
 * last; the latest sample drives the point-in-time dimensions (power,
 * process, workload) while network and duration look across the whole
 * window.
 */

use custodes_domain_models::{ComputePatternTag, RiskBreakdown, RiskScore, RuntimeSignals};

const POWER_WEIGHT: f64 = 0.25;
const NETWORK_WEIGHT: f64 = 0.35;
const PROCESS_WEIGHT: f64 = 0.25;
const WORKLOAD_WEIGHT: f64 = 0.15;
/// `duration_risk` is carried in the breakdown for visibility but
/// deferred from the composite until a longer observation baseline
/// exists to calibrate it against.
const DURATION_WEIGHT: f64 = 0.0;

/// Computes the composite risk score for `job_id` from a rolling window
/// of samples (chronological, newest last). An empty window yields a
/// zeroed score rather than an error — there is simply nothing to flag.
pub fn compute_risk(job_id: uuid::Uuid, window: &[RuntimeSignals]) -> RiskScore {
    let Some(latest) = window.last() else {
        return RiskScore { job_id, composite: 0, breakdown: RiskBreakdown::default(), computed_at: chrono::Utc::now() };
    };

    let breakdown = RiskBreakdown {
        power_risk: power_risk(latest),
        network_risk: network_risk(window),
        process_risk: process_risk(latest),
        workload_risk: workload_risk(latest),
        duration_risk: duration_risk(window),
    };

    let composite = (breakdown.power_risk * POWER_WEIGHT
        + breakdown.network_risk * NETWORK_WEIGHT
        + breakdown.process_risk * PROCESS_WEIGHT
        + breakdown.workload_risk * WORKLOAD_WEIGHT
        + breakdown.duration_risk * DURATION_WEIGHT)
        .clamp(0.0, 100.0);

    RiskScore { job_id, composite: composite.round() as u8, breakdown, computed_at: chrono::Utc::now() }
}

fn power_risk(signals: &RuntimeSignals) -> f64 {
    let overage_pct = ((signals.power_draw_watts / signals.power_cap_watts) - 1.0) * 100.0;
    let throttle_component = if signals.is_throttling { 30.0 } else { 0.0 };
    (overage_pct.max(0.0) * 4.0 + throttle_component).clamp(0.0, 100.0)
}

fn network_risk(window: &[RuntimeSignals]) -> f64 {
    let latest = window.last().expect("window is non-empty");
    let baseline = if latest.baseline_bytes_per_sec > 0.0 { latest.baseline_bytes_per_sec } else { 1.0 };
    let volume_ratio = latest.outbound_bytes_per_sec / baseline;
    let volume_component = ((volume_ratio - 1.0).max(0.0) * 15.0).min(60.0);
    let suspicious_component = if latest.suspicious_destinations.is_empty() { 0.0 } else { 40.0 };
    let scan_component = if latest.unique_destination_ips >= 50 { 20.0 } else { 0.0 };
    (volume_component + suspicious_component + scan_component).clamp(0.0, 100.0)
}

fn process_risk(signals: &RuntimeSignals) -> f64 {
    let process_component = signals.unexpected_processes.len() as f64 * 20.0;
    let escalation_component = signals.privilege_escalation_attempts as f64 * 50.0;
    (process_component + escalation_component).clamp(0.0, 100.0)
}

fn workload_risk(signals: &RuntimeSignals) -> f64 {
    let mismatch = match (&signals.declared_framework, &signals.detected_framework) {
        (Some(declared), Some(detected)) => {
            let normalize = |s: &str| s.to_lowercase().chars().filter(|c| c.is_alphanumeric()).collect::<String>();
            let d = normalize(declared);
            let t = normalize(detected);
            !d.is_empty() && !t.is_empty() && !d.contains(&t) && !t.contains(&d)
        }
        _ => false,
    };
    if mismatch {
        40.0
    } else {
        0.0
    }
}

/// Fraction of the window showing any elevated signal (throttling,
/// suspicious destinations, or unexpected processes), scaled to 0-100 —
/// a brief spike scores far lower than a sustained condition.
fn duration_risk(window: &[RuntimeSignals]) -> f64 {
    if window.is_empty() {
        return 0.0;
    }
    let elevated = window
        .iter()
        .filter(|s| s.is_throttling || !s.suspicious_destinations.is_empty() || !s.unexpected_processes.is_empty())
        .count();
    (elevated as f64 / window.len() as f64) * 100.0
}
