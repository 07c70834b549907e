// [libs/domain/models/src/detection.rs]
//! Tutela's rule, signal, incident, and risk-score shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalySeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnomalyType {
    PowerViolation,
    VramOverclaim,
    ThermalThrottleSustained,
    PortScan,
    ArpScan,
    CryptoPoolConnection,
    TorExitConnection,
    DataExfiltration,
    CryptoMiningPattern,
    FrameworkMismatch,
    UnexpectedProcess,
    PrivilegeEscalation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ThreatCategory {
    ResourceAbuse,
    NetworkAbuse,
    WorkloadAbuse,
    ProcessTampering,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseAction {
    LogOnly,
    WarnSubject,
    KillJob,
    KillAndSuspend,
    KillAndBan,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseSpec {
    pub action: ResponseAction,
    pub notify_subject: bool,
    pub notify_institution: bool,
    pub notify_platform_admin: bool,
    pub generate_evidence: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thresholds {
    pub power_grace_pct: f64,
    pub vram_overclaim_ratio: f64,
    pub throttle_temp_celsius: f64,
    pub port_scan_unique_ip_threshold: u32,
    pub outbound_baseline_multiplier: f64,
    pub outbound_gpu_util_ceiling: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            power_grace_pct: 5.0,
            vram_overclaim_ratio: 1.2,
            throttle_temp_celsius: 85.0,
            port_scan_unique_ip_threshold: 50,
            outbound_baseline_multiplier: 5.0,
            outbound_gpu_util_ceiling: 20.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionRule {
    pub rule_id: Uuid,
    pub version: (u32, u32, u32),
    pub anomaly_type: AnomalyType,
    pub threat_category: ThreatCategory,
    pub severity: AnomalySeverity,
    pub thresholds: Thresholds,
    pub response: ResponseSpec,
    pub is_active: bool,
    pub created_from_incident: Option<Uuid>,
    pub false_positive_count: u32,
}

impl DetectionRule {
    pub fn version_string(&self) -> String {
        format!("{}.{}.{}", self.version.0, self.version.1, self.version.2)
    }

    pub fn bump_patch(&mut self) {
        self.version.2 += 1;
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComputePatternTag {
    Normal,
    CryptoMining,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSignals {
    pub job_id: Uuid,
    pub node_id: Uuid,
    pub gpu_id: Uuid,
    pub gpu_utilization_pct: f64,
    pub vram_used_gb: f64,
    pub vram_allocated_gb: f64,
    pub power_draw_watts: f64,
    pub power_cap_watts: f64,
    pub temperature_celsius: f64,
    pub is_throttling: bool,
    pub outbound_bytes_per_sec: f64,
    pub baseline_bytes_per_sec: f64,
    pub unique_destination_ips: u32,
    pub connection_count: u32,
    pub suspicious_destinations: Vec<String>,
    pub arp_scan_detected: bool,
    pub tor_exit_match: bool,
    pub declared_framework: Option<String>,
    pub detected_framework: Option<String>,
    pub compute_pattern: ComputePatternTag,
    pub unexpected_processes: Vec<String>,
    pub privilege_escalation_attempts: u32,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Anomaly {
    pub anomaly_type: AnomalyType,
    pub severity: AnomalySeverity,
    pub rule_id: Uuid,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IncidentStatus {
    Active,
    Resolved,
    Escalated,
    FalsePositive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: Uuid,
    pub job_id: Uuid,
    pub subject_id: Uuid,
    pub node_id: Uuid,
    pub triggered_anomalies: Vec<Anomaly>,
    pub rule_ids: Vec<Uuid>,
    pub action_taken: ResponseAction,
    pub signal_snapshot: RuntimeSignals,
    pub evidence_entry_ids: Vec<Uuid>,
    pub status: IncidentStatus,
    pub created_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskBreakdown {
    pub power_risk: f64,
    pub network_risk: f64,
    pub process_risk: f64,
    pub workload_risk: f64,
    pub duration_risk: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskScore {
    pub job_id: Uuid,
    pub composite: u8,
    pub breakdown: RiskBreakdown,
    pub computed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResult {
    pub anomalies: Vec<Anomaly>,
    pub risk_score: RiskScore,
    pub requires_action: bool,
    pub incident: Option<Incident>,
    pub action_taken: ResponseAction,
}
