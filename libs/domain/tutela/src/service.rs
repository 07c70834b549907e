// [libs/domain/tutela/src/service.rs]
/*!
 * APARATO: DETECTOR
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: INGESTA DE SEÑALES, EVALUACIÓN DE REGLAS, SCORING DE
 * RIESGO Y DESPACHO DE RESPUESTA AUTOMATIZADA
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use custodes_domain_models::{
    Anomaly, AnomalySeverity, CommitEventRequest, DetectionRule, EvaluateResult, EventType, Incident,
    IncidentStatus, ResponseAction, ResponseSpec, RuntimeSignals, Severity, Thresholds,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::config::DetectorConfig;
use crate::errors::TutelaError;
use crate::risk::compute_risk;
use crate::rules::evaluate_anomalies;
use crate::store::{IncidentStore, RuleStore, SignalStore, TutelaAtlasSink, TutelaDexteraSink, TutelaObsidianSink};

pub struct Detector<Sig, Rul, Inc, Sink, AtlasSink, DexteraSink>
where
    Sig: SignalStore,
    Rul: RuleStore,
    Inc: IncidentStore,
    Sink: TutelaObsidianSink,
    AtlasSink: TutelaAtlasSink,
    DexteraSink: TutelaDexteraSink,
{
    signals: Arc<Sig>,
    rules: Arc<Rul>,
    incidents: Arc<Inc>,
    ledger: Arc<Sink>,
    atlas: Arc<AtlasSink>,
    dextera: Arc<DexteraSink>,
    config: DetectorConfig,
}

impl<Sig, Rul, Inc, Sink, AtlasSink, DexteraSink> Detector<Sig, Rul, Inc, Sink, AtlasSink, DexteraSink>
where
    Sig: SignalStore,
    Rul: RuleStore,
    Inc: IncidentStore,
    Sink: TutelaObsidianSink,
    AtlasSink: TutelaAtlasSink,
    DexteraSink: TutelaDexteraSink,
{
    pub fn new(
        signals: Arc<Sig>,
        rules: Arc<Rul>,
        incidents: Arc<Inc>,
        ledger: Arc<Sink>,
        atlas: Arc<AtlasSink>,
        dextera: Arc<DexteraSink>,
        config: DetectorConfig,
    ) -> Self {
        Self { signals, rules, incidents, ledger, atlas, dextera, config }
    }

    #[instrument(skip(self, signals))]
    pub async fn ingest(&self, signals: RuntimeSignals) -> Result<(), TutelaError> {
        self.signals.record(signals).await
    }

    /// Records `signals`, evaluates every active rule against it, scores
    /// composite risk over the rolling window, and dispatches the
    /// response tied to the most severe anomaly that fired.
    #[instrument(skip(self, signals))]
    pub async fn evaluate(&self, signals: RuntimeSignals, subject_id: Uuid, ip_hash: String) -> Result<EvaluateResult, TutelaError> {
        let job_id = signals.job_id;
        let node_id = signals.node_id;
        self.signals.record(signals.clone()).await?;

        let rules = self.rules.list_active().await?;
        let anomalies = evaluate_anomalies(&signals, &rules, &self.config);

        let since = Utc::now() - Duration::seconds(self.config.risk_score_window_seconds);
        let window = self.signals.window(node_id, since).await?;
        let risk_score = compute_risk(job_id, &window);

        let requires_action = !anomalies.is_empty();
        if !requires_action {
            return Ok(EvaluateResult { anomalies, risk_score, requires_action, incident: None, action_taken: ResponseAction::LogOnly });
        }

        let response = pick_response(&anomalies, &rules);
        self.emit_anomaly_detected(&signals, subject_id, &anomalies, ip_hash.clone()).await?;

        let evidence_entry_ids = if response.generate_evidence && is_destructive(response.action) {
            self.ledger.generate_evidence(job_id).await?.entry_ids
        } else {
            Vec::new()
        };

        let incident = Incident {
            incident_id: Uuid::new_v4(),
            job_id,
            subject_id,
            node_id,
            triggered_anomalies: anomalies.clone(),
            rule_ids: anomalies.iter().map(|a| a.rule_id).collect(),
            action_taken: response.action,
            signal_snapshot: signals.clone(),
            evidence_entry_ids,
            status: IncidentStatus::Active,
            created_at: Utc::now(),
            notes: None,
        };
        self.incidents.upsert(incident.clone()).await?;

        self.dispatch(response.action, &signals, subject_id, ip_hash).await?;

        Ok(EvaluateResult { anomalies, risk_score, requires_action, incident: Some(incident), action_taken: response.action })
    }

    /// Emits one `ANOMALY_DETECTED` ledger entry per anomaly in the
    /// batch, rather than a single aggregated entry, so each anomaly
    /// carries its own chained, independently-referenceable record.
    async fn emit_anomaly_detected(&self, signals: &RuntimeSignals, subject_id: Uuid, anomalies: &[Anomaly], ip_hash: String) -> Result<(), TutelaError> {
        for anomaly in anomalies {
            let mut metadata = BTreeMap::new();
            metadata.insert("anomaly_type".to_string(), format!("{:?}", anomaly.anomaly_type));
            metadata.insert("severity".to_string(), format!("{:?}", anomaly.severity));
            metadata.insert("rule_id".to_string(), anomaly.rule_id.to_string());
            metadata.insert("detail".to_string(), anomaly.detail.clone());

            self.ledger
                .emit(CommitEventRequest {
                    event_type: EventType::AnomalyDetected,
                    severity: Some(Severity::Security),
                    subject_id,
                    passport_id: None,
                    institution_id: None,
                    target_id: Some(signals.job_id.to_string()),
                    target_type: Some("job".to_string()),
                    metadata,
                    ip_hash: ip_hash.clone(),
                    region: None,
                })
                .await?;
        }
        Ok(())
    }

    async fn dispatch(&self, action: ResponseAction, signals: &RuntimeSignals, subject_id: Uuid, ip_hash: String) -> Result<(), TutelaError> {
        match action {
            ResponseAction::LogOnly => {}
            ResponseAction::WarnSubject => {
                warn!(subject_id = %subject_id, job_id = %signals.job_id, "subject warned over detected anomaly");
            }
            ResponseAction::KillJob => {
                self.atlas.kill_job(signals.job_id, ip_hash.clone()).await?;
                self.emit_kill_switch(signals, subject_id, ip_hash).await?;
            }
            ResponseAction::KillAndSuspend => {
                self.atlas.kill_job(signals.job_id, ip_hash.clone()).await?;
                self.atlas.suspend_node(signals.node_id, ip_hash.clone()).await?;
                self.emit_kill_switch(signals, subject_id, ip_hash.clone()).await?;
                self.emit_clearance_revoked(subject_id, signals.node_id, ip_hash).await?;
            }
            ResponseAction::KillAndBan => {
                self.atlas.kill_job(signals.job_id, ip_hash.clone()).await?;
                self.dextera.ban(subject_id, "automated anomaly response".to_string(), ip_hash.clone()).await?;
                self.emit_kill_switch(signals, subject_id, ip_hash.clone()).await?;
                self.emit_clearance_revoked(subject_id, signals.node_id, ip_hash).await?;
            }
        }
        Ok(())
    }

    async fn emit_kill_switch(&self, signals: &RuntimeSignals, subject_id: Uuid, ip_hash: String) -> Result<(), TutelaError> {
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::KillSwitchFired,
                severity: Some(Severity::Security),
                subject_id,
                passport_id: None,
                institution_id: None,
                target_id: Some(signals.job_id.to_string()),
                target_type: Some("job".to_string()),
                metadata: BTreeMap::new(),
                ip_hash,
                region: None,
            })
            .await?;
        Ok(())
    }

    async fn emit_clearance_revoked(&self, subject_id: Uuid, node_id: Uuid, ip_hash: String) -> Result<(), TutelaError> {
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::ClearanceRevoked,
                severity: Some(Severity::Security),
                subject_id,
                passport_id: None,
                institution_id: None,
                target_id: Some(node_id.to_string()),
                target_type: Some("node".to_string()),
                metadata: BTreeMap::new(),
                ip_hash,
                region: None,
            })
            .await?;
        Ok(())
    }

    /// Admin-triggered halt of an entire node, bypassing rule
    /// evaluation entirely. Gated on `config.enable_emergency_halt` so
    /// an operator can disable the kill switch itself during a known
    /// false-positive storm.
    #[instrument(skip(self))]
    pub async fn emergency_halt(&self, node_id: Uuid, triggered_by_subject_id: Uuid, ip_hash: String) -> Result<Vec<Uuid>, TutelaError> {
        if !self.config.enable_emergency_halt {
            return Err(TutelaError::HaltDisabled);
        }
        let killed = self.atlas.suspend_node(node_id, ip_hash.clone()).await?;
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::KillSwitchFired,
                severity: Some(Severity::Security),
                subject_id: triggered_by_subject_id,
                passport_id: None,
                institution_id: None,
                target_id: Some(node_id.to_string()),
                target_type: Some("node".to_string()),
                metadata: BTreeMap::new(),
                ip_hash: ip_hash.clone(),
                region: None,
            })
            .await?;
        self.emit_clearance_revoked(triggered_by_subject_id, node_id, ip_hash).await?;
        Ok(killed)
    }

    pub async fn tune_rule(&self, rule_id: Uuid, thresholds: Thresholds) -> Result<DetectionRule, TutelaError> {
        let mut rule = self.rules.get(rule_id).await?.ok_or(custodes_domain_models::errors::RuleFault::RuleNotFound(rule_id))?;
        rule.thresholds = thresholds;
        rule.bump_patch();
        self.rules.upsert(rule.clone()).await?;
        Ok(rule)
    }

    pub async fn mark_false_positive(&self, incident_id: Uuid) -> Result<Incident, TutelaError> {
        let mut incident = self.incidents.get(incident_id).await?.ok_or(custodes_domain_models::errors::ResourceFault::NotFound(format!("incident {incident_id}")))?;
        incident.status = IncidentStatus::FalsePositive;
        self.incidents.upsert(incident.clone()).await?;

        for rule_id in &incident.rule_ids {
            if let Some(mut rule) = self.rules.get(*rule_id).await? {
                rule.false_positive_count += 1;
                self.rules.upsert(rule).await?;
            }
        }
        Ok(incident)
    }

    /// Seeds and persists the platform's baseline detection ruleset,
    /// one rule per anomaly type at its documented default thresholds.
    /// Safe to call more than once — each call allocates fresh rule ids,
    /// so callers seed an empty instance, not re-seed a live one.
    pub async fn seed_default_rules(&self) -> Result<Vec<Uuid>, TutelaError> {
        let mut ids = Vec::new();
        for rule in default_rules() {
            ids.push(rule.rule_id);
            self.rules.upsert(rule).await?;
        }
        Ok(ids)
    }
}

fn is_destructive(action: ResponseAction) -> bool {
    matches!(action, ResponseAction::KillJob | ResponseAction::KillAndSuspend | ResponseAction::KillAndBan)
}

/// Picks the response tied to the rule behind the most severe anomaly
/// in the batch (ties broken by `rule_id`), matching the "highest
/// severity wins" ordering used across the other pillars' decision
/// logic.
fn pick_response(anomalies: &[Anomaly], rules: &[DetectionRule]) -> ResponseSpec {
    let worst = anomalies
        .iter()
        .max_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.rule_id.cmp(&b.rule_id)))
        .expect("anomalies is non-empty");

    rules
        .iter()
        .find(|r| r.rule_id == worst.rule_id)
        .map(|r| r.response.clone())
        .unwrap_or(ResponseSpec { action: ResponseAction::LogOnly, notify_subject: false, notify_institution: false, notify_platform_admin: false, generate_evidence: false })
}

fn default_rules() -> Vec<DetectionRule> {
    use custodes_domain_models::{AnomalyType, ThreatCategory};

    let mk = |anomaly_type: AnomalyType, threat_category: ThreatCategory, severity: AnomalySeverity, action: ResponseAction| DetectionRule {
        rule_id: Uuid::new_v4(),
        version: (1, 0, 0),
        anomaly_type,
        threat_category,
        severity,
        thresholds: Thresholds::default(),
        response: ResponseSpec { action, notify_subject: true, notify_institution: matches!(action, ResponseAction::KillAndSuspend | ResponseAction::KillAndBan), notify_platform_admin: matches!(action, ResponseAction::KillAndBan), generate_evidence: !matches!(action, ResponseAction::LogOnly) },
        is_active: true,
        created_from_incident: None,
        false_positive_count: 0,
    };

    vec![
        mk(AnomalyType::PowerViolation, ThreatCategory::ResourceAbuse, AnomalySeverity::Low, ResponseAction::WarnSubject),
        mk(AnomalyType::VramOverclaim, ThreatCategory::ResourceAbuse, AnomalySeverity::Medium, ResponseAction::KillJob),
        mk(AnomalyType::ThermalThrottleSustained, ThreatCategory::ResourceAbuse, AnomalySeverity::Medium, ResponseAction::WarnSubject),
        mk(AnomalyType::PortScan, ThreatCategory::NetworkAbuse, AnomalySeverity::High, ResponseAction::KillAndSuspend),
        mk(AnomalyType::ArpScan, ThreatCategory::NetworkAbuse, AnomalySeverity::High, ResponseAction::KillAndSuspend),
        mk(AnomalyType::CryptoPoolConnection, ThreatCategory::WorkloadAbuse, AnomalySeverity::Critical, ResponseAction::KillAndBan),
        mk(AnomalyType::TorExitConnection, ThreatCategory::NetworkAbuse, AnomalySeverity::Critical, ResponseAction::KillAndSuspend),
        mk(AnomalyType::DataExfiltration, ThreatCategory::NetworkAbuse, AnomalySeverity::Critical, ResponseAction::KillAndBan),
        mk(AnomalyType::CryptoMiningPattern, ThreatCategory::WorkloadAbuse, AnomalySeverity::Critical, ResponseAction::KillAndBan),
        mk(AnomalyType::FrameworkMismatch, ThreatCategory::WorkloadAbuse, AnomalySeverity::Medium, ResponseAction::WarnSubject),
        mk(AnomalyType::UnexpectedProcess, ThreatCategory::ProcessTampering, AnomalySeverity::High, ResponseAction::KillAndSuspend),
        mk(AnomalyType::PrivilegeEscalation, ThreatCategory::ProcessTampering, AnomalySeverity::Critical, ResponseAction::KillAndBan),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use custodes_domain_models::{CommitResult, ComputePatternTag};
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct MemSignals(Mutex<HashMap<Uuid, Vec<RuntimeSignals>>>);
    #[async_trait]
    impl SignalStore for MemSignals {
        async fn record(&self, signals: RuntimeSignals) -> Result<(), TutelaError> {
            self.0.lock().await.entry(signals.node_id).or_default().push(signals);
            Ok(())
        }
        async fn window(&self, node_id: Uuid, since: chrono::DateTime<Utc>) -> Result<Vec<RuntimeSignals>, TutelaError> {
            Ok(self.0.lock().await.get(&node_id).map(|v| v.iter().filter(|s| s.timestamp >= since).cloned().collect()).unwrap_or_default())
        }
    }

    struct MemRules(Mutex<HashMap<Uuid, DetectionRule>>);
    #[async_trait]
    impl RuleStore for MemRules {
        async fn get(&self, rule_id: Uuid) -> Result<Option<DetectionRule>, TutelaError> {
            Ok(self.0.lock().await.get(&rule_id).cloned())
        }
        async fn upsert(&self, rule: DetectionRule) -> Result<(), TutelaError> {
            self.0.lock().await.insert(rule.rule_id, rule);
            Ok(())
        }
        async fn list_active(&self) -> Result<Vec<DetectionRule>, TutelaError> {
            Ok(self.0.lock().await.values().filter(|r| r.is_active).cloned().collect())
        }
    }

    struct MemIncidents(Mutex<HashMap<Uuid, Incident>>);
    #[async_trait]
    impl IncidentStore for MemIncidents {
        async fn get(&self, incident_id: Uuid) -> Result<Option<Incident>, TutelaError> {
            Ok(self.0.lock().await.get(&incident_id).cloned())
        }
        async fn upsert(&self, incident: Incident) -> Result<(), TutelaError> {
            self.0.lock().await.insert(incident.incident_id, incident);
            Ok(())
        }
        async fn list_active_for_node(&self, node_id: Uuid) -> Result<Vec<Incident>, TutelaError> {
            Ok(self.0.lock().await.values().filter(|i| i.node_id == node_id && i.status == IncidentStatus::Active).cloned().collect())
        }
    }

    struct MemLedger(Mutex<Vec<CommitEventRequest>>);
    #[async_trait]
    impl TutelaObsidianSink for MemLedger {
        async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, TutelaError> {
            self.0.lock().await.push(request);
            Ok(CommitResult { entry_id: Uuid::new_v4(), block_index: 0, block_hash: "h".to_string(), timestamp: Utc::now() })
        }
        async fn generate_evidence(&self, job_id: Uuid) -> Result<custodes_domain_models::EvidencePackage, TutelaError> {
            Ok(custodes_domain_models::EvidencePackage {
                package_id: Uuid::new_v4(),
                kind: custodes_domain_models::EvidenceSubjectKind::Job,
                subject_ref: job_id.to_string(),
                entry_ids: self.0.lock().await.iter().map(|_| Uuid::new_v4()).collect(),
                merkle_root: "root".to_string(),
                proofs: vec![],
                generated_at: Utc::now(),
                signature: "sig".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct MemAtlasSink {
        killed_jobs: Mutex<Vec<Uuid>>,
        suspended_nodes: Mutex<Vec<Uuid>>,
    }
    #[async_trait]
    impl TutelaAtlasSink for MemAtlasSink {
        async fn kill_job(&self, job_id: Uuid, _ip_hash: String) -> Result<(), TutelaError> {
            self.killed_jobs.lock().await.push(job_id);
            Ok(())
        }
        async fn suspend_node(&self, node_id: Uuid, _ip_hash: String) -> Result<Vec<Uuid>, TutelaError> {
            self.suspended_nodes.lock().await.push(node_id);
            Ok(vec![])
        }
    }

    #[derive(Default)]
    struct MemDexteraSink {
        banned: Mutex<Vec<Uuid>>,
    }
    #[async_trait]
    impl TutelaDexteraSink for MemDexteraSink {
        async fn ban(&self, subject_id: Uuid, _reason: String, _ip_hash: String) -> Result<(), TutelaError> {
            self.banned.lock().await.push(subject_id);
            Ok(())
        }
    }

    fn signals(node_id: Uuid, job_id: Uuid) -> RuntimeSignals {
        RuntimeSignals {
            job_id,
            node_id,
            gpu_id: Uuid::new_v4(),
            gpu_utilization_pct: 10.0,
            vram_used_gb: 8.0,
            vram_allocated_gb: 16.0,
            power_draw_watts: 200.0,
            power_cap_watts: 300.0,
            temperature_celsius: 55.0,
            is_throttling: false,
            outbound_bytes_per_sec: 500.0,
            baseline_bytes_per_sec: 500.0,
            unique_destination_ips: 1,
            connection_count: 5,
            suspicious_destinations: vec![],
            arp_scan_detected: false,
            tor_exit_match: false,
            declared_framework: None,
            detected_framework: None,
            compute_pattern: ComputePatternTag::Normal,
            unexpected_processes: vec![],
            privilege_escalation_attempts: 0,
            timestamp: Utc::now(),
        }
    }

    fn detector() -> Detector<MemSignals, MemRules, MemIncidents, MemLedger, MemAtlasSink, MemDexteraSink> {
        Detector::new(
            Arc::new(MemSignals(Mutex::new(HashMap::new()))),
            Arc::new(MemRules(Mutex::new(HashMap::new()))),
            Arc::new(MemIncidents(Mutex::new(HashMap::new()))),
            Arc::new(MemLedger(Mutex::new(Vec::new()))),
            Arc::new(MemAtlasSink::default()),
            Arc::new(MemDexteraSink::default()),
            DetectorConfig::default(),
        )
    }

    #[tokio::test]
    async fn clean_signal_requires_no_action() {
        let detector = detector();
        for rule in default_rules() {
            detector.rules.upsert(rule).await.unwrap();
        }
        let node_id = Uuid::new_v4();
        let result = detector.evaluate(signals(node_id, Uuid::new_v4()), Uuid::new_v4(), "iphash".to_string()).await.unwrap();
        assert!(!result.requires_action);
        assert!(result.incident.is_none());
    }

    #[tokio::test]
    async fn crypto_pool_connection_kills_and_bans() {
        let detector = detector();
        for rule in default_rules() {
            detector.rules.upsert(rule).await.unwrap();
        }
        let node_id = Uuid::new_v4();
        let job_id = Uuid::new_v4();
        let mut hot = signals(node_id, job_id);
        hot.suspicious_destinations = vec!["pool.mining-example.com".to_string()];
        let config_rules = detector.rules.list_active().await.unwrap();
        assert!(config_rules.iter().any(|r| r.anomaly_type == custodes_domain_models::AnomalyType::CryptoPoolConnection));

        // The default config carries no crypto_pool_domains, so seed one
        // through a tuned rule is unnecessary here — the test instead
        // swaps in a detector whose config recognizes the domain.
        let detector = Detector::new(
            Arc::new(MemSignals(Mutex::new(HashMap::new()))),
            Arc::new(MemRules(Mutex::new(HashMap::new()))),
            Arc::new(MemIncidents(Mutex::new(HashMap::new()))),
            Arc::new(MemLedger(Mutex::new(Vec::new()))),
            Arc::new(MemAtlasSink::default()),
            Arc::new(MemDexteraSink::default()),
            DetectorConfig { crypto_pool_domains: vec!["mining-example.com".to_string()], ..DetectorConfig::default() },
        );
        for rule in default_rules() {
            detector.rules.upsert(rule).await.unwrap();
        }

        let result = detector.evaluate(hot, Uuid::new_v4(), "iphash".to_string()).await.unwrap();
        assert!(result.requires_action);
        assert_eq!(result.action_taken, ResponseAction::KillAndBan);
        assert_eq!(detector.incidents.list_active_for_node(node_id).await.unwrap().len(), 1);
        assert!(!result.incident.unwrap().evidence_entry_ids.is_empty(), "a destructive response must capture an evidence package first");
    }

    #[tokio::test]
    async fn warn_only_response_never_generates_evidence() {
        let detector = detector();
        for rule in default_rules() {
            detector.rules.upsert(rule).await.unwrap();
        }
        let node_id = Uuid::new_v4();
        let mut throttling = signals(node_id, Uuid::new_v4());
        throttling.is_throttling = true;
        throttling.temperature_celsius = 95.0;

        let result = detector.evaluate(throttling, Uuid::new_v4(), "iphash".to_string()).await.unwrap();
        assert_eq!(result.action_taken, ResponseAction::WarnSubject);
        assert!(result.incident.unwrap().evidence_entry_ids.is_empty());
    }

    #[tokio::test]
    async fn each_anomaly_in_a_batch_emits_its_own_ledger_entry() {
        let detector = detector();
        for rule in default_rules() {
            detector.rules.upsert(rule).await.unwrap();
        }
        let node_id = Uuid::new_v4();
        let mut overheating = signals(node_id, Uuid::new_v4());
        overheating.is_throttling = true;
        overheating.temperature_celsius = 95.0;
        overheating.power_draw_watts = 1000.0;

        let result = detector.evaluate(overheating, Uuid::new_v4(), "iphash".to_string()).await.unwrap();
        assert_eq!(result.anomalies.len(), 2);

        let entries = detector.ledger.0.lock().await;
        let anomaly_entries = entries.iter().filter(|e| e.event_type == EventType::AnomalyDetected).count();
        assert_eq!(anomaly_entries, 2, "expected one ANOMALY_DETECTED entry per fired anomaly");
    }

    #[tokio::test]
    async fn emergency_halt_respects_the_disable_flag() {
        let mut config = DetectorConfig::default();
        config.enable_emergency_halt = false;
        let detector = Detector::new(
            Arc::new(MemSignals(Mutex::new(HashMap::new()))),
            Arc::new(MemRules(Mutex::new(HashMap::new()))),
            Arc::new(MemIncidents(Mutex::new(HashMap::new()))),
            Arc::new(MemLedger(Mutex::new(Vec::new()))),
            Arc::new(MemAtlasSink::default()),
            Arc::new(MemDexteraSink::default()),
            config,
        );
        let result = detector.emergency_halt(Uuid::new_v4(), Uuid::new_v4(), "iphash".to_string()).await;
        assert!(matches!(result, Err(TutelaError::HaltDisabled)));
    }

    #[tokio::test]
    async fn marking_a_false_positive_increments_the_rule_counter() {
        let detector = detector();
        let rule = default_rules().into_iter().next().unwrap();
        let rule_id = rule.rule_id;
        detector.rules.upsert(rule).await.unwrap();

        let incident = Incident {
            incident_id: Uuid::new_v4(),
            job_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            node_id: Uuid::new_v4(),
            triggered_anomalies: vec![],
            rule_ids: vec![rule_id],
            action_taken: ResponseAction::WarnSubject,
            signal_snapshot: signals(Uuid::new_v4(), Uuid::new_v4()),
            evidence_entry_ids: vec![],
            status: IncidentStatus::Active,
            created_at: Utc::now(),
            notes: None,
        };
        detector.incidents.upsert(incident.clone()).await.unwrap();

        let updated = detector.mark_false_positive(incident.incident_id).await.unwrap();
        assert_eq!(updated.status, IncidentStatus::FalsePositive);
        let rule = detector.rules.get(rule_id).await.unwrap().unwrap();
        assert_eq!(rule.false_positive_count, 1);
    }
}
