// [libs/domain/tutela/src/rules.rs]
/*!
 * APARATO: ANOMALY RULE EVALUATION
 * CLASIFICACIÓN: PURE DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: EVALUACIÓN DE SEÑALES CONTRA REGLAS ACTIVAS
 *
 * Each active rule is checked against the latest signal sample
 * independently; a single sample can trigger more than one anomaly
 * (e.g. a throttling, over-powered job also running a crypto pattern).
 */

use custodes_domain_models::{Anomaly, AnomalyType, ComputePatternTag, DetectionRule, RuntimeSignals};

use crate::config::DetectorConfig;

/// Runs every active rule against `signals`, returning one `Anomaly`
/// per rule whose anomaly type fires.
pub fn evaluate_anomalies(signals: &RuntimeSignals, rules: &[DetectionRule], config: &DetectorConfig) -> Vec<Anomaly> {
    rules
        .iter()
        .filter(|rule| rule.is_active)
        .filter_map(|rule| fires(rule, signals, config).map(|detail| Anomaly { anomaly_type: rule.anomaly_type, severity: rule.severity, rule_id: rule.rule_id, detail }))
        .collect()
}

fn fires(rule: &DetectionRule, signals: &RuntimeSignals, config: &DetectorConfig) -> Option<String> {
    match rule.anomaly_type {
        AnomalyType::PowerViolation => power_violation(signals, rule.thresholds.power_grace_pct),
        AnomalyType::VramOverclaim => vram_overclaim(signals, rule.thresholds.vram_overclaim_ratio),
        AnomalyType::ThermalThrottleSustained => thermal_throttle(signals, rule.thresholds.throttle_temp_celsius),
        AnomalyType::PortScan => port_scan(signals, rule.thresholds.port_scan_unique_ip_threshold),
        AnomalyType::ArpScan => arp_scan(signals),
        AnomalyType::CryptoPoolConnection => crypto_pool_connection(signals, &config.crypto_pool_domains),
        AnomalyType::TorExitConnection => tor_exit_connection(signals, &config.tor_exit_ips),
        AnomalyType::DataExfiltration => data_exfiltration(signals, rule.thresholds.outbound_baseline_multiplier),
        AnomalyType::CryptoMiningPattern => crypto_mining_pattern(signals, rule.thresholds.outbound_gpu_util_ceiling),
        AnomalyType::FrameworkMismatch => framework_mismatch(signals),
        AnomalyType::UnexpectedProcess => unexpected_process(signals),
        AnomalyType::PrivilegeEscalation => privilege_escalation(signals),
    }
}

fn power_violation(signals: &RuntimeSignals, grace_pct: f64) -> Option<String> {
    let ceiling = signals.power_cap_watts * (1.0 + grace_pct / 100.0);
    (signals.power_draw_watts > ceiling)
        .then(|| format!("power draw {:.0}W exceeds {:.0}W cap plus {grace_pct:.1}% grace", signals.power_draw_watts, signals.power_cap_watts))
}

fn vram_overclaim(signals: &RuntimeSignals, ratio: f64) -> Option<String> {
    (signals.vram_used_gb > signals.vram_allocated_gb * ratio)
        .then(|| format!("vram used {:.1}GB exceeds {ratio:.2}x of allocated {:.1}GB", signals.vram_used_gb, signals.vram_allocated_gb))
}

fn thermal_throttle(signals: &RuntimeSignals, threshold_celsius: f64) -> Option<String> {
    (signals.is_throttling && signals.temperature_celsius >= threshold_celsius)
        .then(|| format!("sustained throttle at {:.1}C", signals.temperature_celsius))
}

fn port_scan(signals: &RuntimeSignals, unique_ip_threshold: u32) -> Option<String> {
    (signals.unique_destination_ips >= unique_ip_threshold)
        .then(|| format!("{} unique destination IPs exceeds threshold {unique_ip_threshold}", signals.unique_destination_ips))
}

fn arp_scan(signals: &RuntimeSignals) -> Option<String> {
    // The agent flags an ARP scan directly; absent that, a connection-count
    // spike with zero meaningful outbound volume is the same signature.
    (signals.arp_scan_detected || (signals.connection_count > 200 && signals.outbound_bytes_per_sec < 1024.0))
        .then(|| format!("{} connections with negligible outbound volume", signals.connection_count))
}

fn crypto_pool_connection(signals: &RuntimeSignals, pool_domains: &[String]) -> Option<String> {
    let hit = signals.suspicious_destinations.iter().find(|dest| pool_domains.iter().any(|pool| dest.contains(pool.as_str())))?;
    Some(format!("connection to known mining pool domain: {hit}"))
}

fn tor_exit_connection(signals: &RuntimeSignals, tor_exit_ips: &[String]) -> Option<String> {
    if signals.tor_exit_match {
        return Some("agent flagged connection as a Tor exit node".to_string());
    }
    let hit = signals.suspicious_destinations.iter().find(|dest| tor_exit_ips.iter().any(|ip| dest == ip))?;
    Some(format!("connection to known Tor exit node: {hit}"))
}

fn framework_mismatch(signals: &RuntimeSignals) -> Option<String> {
    let declared = signals.declared_framework.as_ref()?;
    let detected = signals.detected_framework.as_ref()?;
    let normalize = |s: &str| s.to_lowercase().chars().filter(|c| c.is_alphanumeric()).collect::<String>();
    let d = normalize(declared);
    let t = normalize(detected);
    (!d.is_empty() && !t.is_empty() && !d.contains(&t) && !t.contains(&d))
        .then(|| format!("declared framework '{declared}' does not match detected framework '{detected}'"))
}

fn data_exfiltration(signals: &RuntimeSignals, baseline_multiplier: f64) -> Option<String> {
    (signals.outbound_bytes_per_sec > signals.baseline_bytes_per_sec * baseline_multiplier)
        .then(|| format!("outbound {:.0}B/s exceeds {baseline_multiplier:.1}x baseline {:.0}B/s", signals.outbound_bytes_per_sec, signals.baseline_bytes_per_sec))
}

fn crypto_mining_pattern(signals: &RuntimeSignals, gpu_util_ceiling: f64) -> Option<String> {
    (signals.compute_pattern == ComputePatternTag::CryptoMining && signals.gpu_utilization_pct >= gpu_util_ceiling)
        .then(|| "sustained high-utilization pattern consistent with crypto mining".to_string())
}

fn unexpected_process(signals: &RuntimeSignals) -> Option<String> {
    (!signals.unexpected_processes.is_empty()).then(|| format!("unexpected process(es): {}", signals.unexpected_processes.join(", ")))
}

fn privilege_escalation(signals: &RuntimeSignals) -> Option<String> {
    (signals.privilege_escalation_attempts > 0).then(|| format!("{} privilege escalation attempt(s)", signals.privilege_escalation_attempts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodes_domain_models::{AnomalySeverity, ResponseAction, ResponseSpec, ThreatCategory, Thresholds};
    use uuid::Uuid;

    fn base_signals() -> RuntimeSignals {
        RuntimeSignals {
            job_id: Uuid::new_v4(),
            node_id: Uuid::new_v4(),
            gpu_id: Uuid::new_v4(),
            gpu_utilization_pct: 40.0,
            vram_used_gb: 10.0,
            vram_allocated_gb: 16.0,
            power_draw_watts: 200.0,
            power_cap_watts: 300.0,
            temperature_celsius: 60.0,
            is_throttling: false,
            outbound_bytes_per_sec: 1000.0,
            baseline_bytes_per_sec: 1000.0,
            unique_destination_ips: 2,
            connection_count: 10,
            suspicious_destinations: vec![],
            arp_scan_detected: false,
            tor_exit_match: false,
            declared_framework: None,
            detected_framework: None,
            compute_pattern: ComputePatternTag::Normal,
            unexpected_processes: vec![],
            privilege_escalation_attempts: 0,
            timestamp: chrono::Utc::now(),
        }
    }

    fn rule(anomaly_type: AnomalyType) -> DetectionRule {
        DetectionRule {
            rule_id: Uuid::new_v4(),
            version: (1, 0, 0),
            anomaly_type,
            threat_category: ThreatCategory::ResourceAbuse,
            severity: AnomalySeverity::High,
            thresholds: Thresholds::default(),
            response: ResponseSpec { action: ResponseAction::WarnSubject, notify_subject: true, notify_institution: false, notify_platform_admin: false, generate_evidence: false },
            is_active: true,
            created_from_incident: None,
            false_positive_count: 0,
        }
    }

    #[test]
    fn power_draw_within_grace_does_not_fire() {
        let mut signals = base_signals();
        signals.power_draw_watts = 310.0;
        let anomalies = evaluate_anomalies(&signals, &[rule(AnomalyType::PowerViolation)], &DetectorConfig::default());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn power_draw_past_grace_fires() {
        let mut signals = base_signals();
        signals.power_draw_watts = 400.0;
        let anomalies = evaluate_anomalies(&signals, &[rule(AnomalyType::PowerViolation)], &DetectorConfig::default());
        assert_eq!(anomalies.len(), 1);
        assert_eq!(anomalies[0].anomaly_type, AnomalyType::PowerViolation);
    }

    #[test]
    fn crypto_pool_domain_match_fires_even_with_low_utilization() {
        let mut signals = base_signals();
        signals.suspicious_destinations = vec!["pool.mining-example.com".to_string()];
        let config = DetectorConfig { crypto_pool_domains: vec!["mining-example.com".to_string()], ..DetectorConfig::default() };
        let anomalies = evaluate_anomalies(&signals, &[rule(AnomalyType::CryptoPoolConnection)], &config);
        assert_eq!(anomalies.len(), 1);
    }

    #[test]
    fn arp_scan_flag_fires_regardless_of_connection_volume() {
        let mut signals = base_signals();
        signals.arp_scan_detected = true;
        signals.connection_count = 3;
        signals.outbound_bytes_per_sec = 50_000.0;
        let anomalies = evaluate_anomalies(&signals, &[rule(AnomalyType::ArpScan)], &DetectorConfig::default());
        assert_eq!(anomalies.len(), 1);
    }

    #[test]
    fn tor_exit_flag_fires_without_a_configured_ip_list() {
        let mut signals = base_signals();
        signals.tor_exit_match = true;
        let anomalies = evaluate_anomalies(&signals, &[rule(AnomalyType::TorExitConnection)], &DetectorConfig::default());
        assert_eq!(anomalies.len(), 1);
    }

    #[test]
    fn declared_and_detected_framework_agreeing_does_not_fire() {
        let mut signals = base_signals();
        signals.declared_framework = Some("PyTorch-2.1".to_string());
        signals.detected_framework = Some("pytorch_2_1".to_string());
        let anomalies = evaluate_anomalies(&signals, &[rule(AnomalyType::FrameworkMismatch)], &DetectorConfig::default());
        assert!(anomalies.is_empty());
    }

    #[test]
    fn declared_and_detected_framework_disagreeing_fires_as_medium() {
        let mut signals = base_signals();
        signals.declared_framework = Some("pytorch".to_string());
        signals.detected_framework = Some("tensorflow".to_string());
        let anomalies = evaluate_anomalies(&signals, &[rule(AnomalyType::FrameworkMismatch)], &DetectorConfig::default());
        assert_eq!(anomalies.len(), 1);
    }

    #[test]
    fn inactive_rule_never_fires() {
        let mut signals = base_signals();
        signals.power_draw_watts = 1000.0;
        let mut inactive = rule(AnomalyType::PowerViolation);
        inactive.is_active = false;
        let anomalies = evaluate_anomalies(&signals, &[inactive], &DetectorConfig::default());
        assert!(anomalies.is_empty());
    }
}
