// [libs/infra/store/src/tutela.rs]
/*!
 * APARATO: TUTELA IN-MEMORY STORES Y PUENTES HACIA ATLAS Y DEXTERA
 * CLASIFICACIÓN: INFRA ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: VENTANA DE SEÑALES, REGLAS, INCIDENTES, Y PUENTES
 * NARROW HACIA LOS MOTORES DE ATLAS Y DEXTERA
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use custodes_atlas::errors::AtlasError;
use custodes_dextera::errors::DexteraError;
use custodes_domain_models::{
    CommitEventRequest, CommitResult, DetectionRule, EvidencePackage, EvidenceSubjectKind, FinalAllocationStatus, Incident,
    RuntimeSignals,
};
use custodes_tutela::errors::TutelaError;
use custodes_tutela::store::{IncidentStore, RuleStore, SignalStore, TutelaAtlasSink, TutelaDexteraSink, TutelaObsidianSink};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::atlas::{MemAllocationStore, MemRegistry};
use crate::dextera::MemDextera;
use crate::obsidian::MemLedger;

#[derive(Default)]
pub struct MemSignalStore {
    by_node: RwLock<HashMap<Uuid, Vec<RuntimeSignals>>>,
}

#[async_trait]
impl SignalStore for MemSignalStore {
    async fn record(&self, signals: RuntimeSignals) -> Result<(), TutelaError> {
        self.by_node.write().await.entry(signals.node_id).or_default().push(signals);
        Ok(())
    }

    async fn window(&self, node_id: Uuid, since: DateTime<Utc>) -> Result<Vec<RuntimeSignals>, TutelaError> {
        Ok(self
            .by_node
            .read()
            .await
            .get(&node_id)
            .map(|samples| samples.iter().filter(|s| s.timestamp >= since).cloned().collect())
            .unwrap_or_default())
    }
}

#[derive(Default)]
pub struct MemRuleStore {
    rules: RwLock<HashMap<Uuid, DetectionRule>>,
}

#[async_trait]
impl RuleStore for MemRuleStore {
    async fn get(&self, rule_id: Uuid) -> Result<Option<DetectionRule>, TutelaError> {
        Ok(self.rules.read().await.get(&rule_id).cloned())
    }

    async fn upsert(&self, rule: DetectionRule) -> Result<(), TutelaError> {
        self.rules.write().await.insert(rule.rule_id, rule);
        Ok(())
    }

    async fn list_active(&self) -> Result<Vec<DetectionRule>, TutelaError> {
        Ok(self.rules.read().await.values().filter(|r| r.is_active).cloned().collect())
    }
}

#[derive(Default)]
pub struct MemIncidentStore {
    incidents: RwLock<HashMap<Uuid, Incident>>,
}

#[async_trait]
impl IncidentStore for MemIncidentStore {
    async fn get(&self, incident_id: Uuid) -> Result<Option<Incident>, TutelaError> {
        Ok(self.incidents.read().await.get(&incident_id).cloned())
    }

    async fn upsert(&self, incident: Incident) -> Result<(), TutelaError> {
        self.incidents.write().await.insert(incident.incident_id, incident);
        Ok(())
    }

    async fn list_active_for_node(&self, node_id: Uuid) -> Result<Vec<Incident>, TutelaError> {
        Ok(self
            .incidents
            .read()
            .await
            .values()
            .filter(|i| i.node_id == node_id && matches!(i.status, custodes_domain_models::IncidentStatus::Active))
            .cloned()
            .collect())
    }
}

pub struct TutelaLedgerSink {
    ledger: Arc<MemLedger>,
}

impl TutelaLedgerSink {
    pub fn new(ledger: Arc<MemLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl TutelaObsidianSink for TutelaLedgerSink {
    async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, TutelaError> {
        self.ledger.commit(request).await.map_err(|e| TutelaError::Upstream(e.to_string()))
    }

    async fn generate_evidence(&self, job_id: Uuid) -> Result<EvidencePackage, TutelaError> {
        self.ledger
            .generate_evidence_package(EvidenceSubjectKind::Job, &job_id.to_string())
            .await
            .map_err(|e| TutelaError::Upstream(e.to_string()))
    }
}

/// Tutela only knows the job it's watching, never the allocation id
/// routing produced, so the adapter resolves that mapping itself before
/// delegating to the live registry's `release`/`suspend_node`.
pub struct TutelaRegistrySink {
    registry: Arc<MemRegistry>,
    allocations: Arc<MemAllocationStore>,
}

impl TutelaRegistrySink {
    pub fn new(registry: Arc<MemRegistry>, allocations: Arc<MemAllocationStore>) -> Self {
        Self { registry, allocations }
    }
}

#[async_trait]
impl TutelaAtlasSink for TutelaRegistrySink {
    async fn kill_job(&self, job_id: Uuid, ip_hash: String) -> Result<(), TutelaError> {
        let Some(allocation) = self.allocations.find_by_job(job_id).await else {
            // The job has no live allocation (already released or never
            // routed through Atlas); nothing to kill.
            return Ok(());
        };
        self.registry
            .release(allocation.allocation_id, FinalAllocationStatus::Failed, 0.0, ip_hash)
            .await
            .map_err(map_atlas_error)?;
        Ok(())
    }

    async fn suspend_node(&self, node_id: Uuid, ip_hash: String) -> Result<Vec<Uuid>, TutelaError> {
        self.registry.suspend_node(node_id, ip_hash).await.map_err(map_atlas_error)
    }
}

fn map_atlas_error(e: AtlasError) -> TutelaError {
    match e {
        AtlasError::Resource(r) => TutelaError::Resource(r),
        AtlasError::Upstream(msg) => TutelaError::Upstream(msg),
    }
}

/// The automated-response actor id recorded as the `by` subject when
/// Tutela bans a subject on its own authority rather than an admin's.
pub const AUTOMATED_RESPONSE_ACTOR: Uuid = Uuid::nil();

pub struct TutelaDexteraBanSink {
    dextera: Arc<MemDextera>,
}

impl TutelaDexteraBanSink {
    pub fn new(dextera: Arc<MemDextera>) -> Self {
        Self { dextera }
    }
}

#[async_trait]
impl TutelaDexteraSink for TutelaDexteraBanSink {
    async fn ban(&self, subject_id: Uuid, reason: String, ip_hash: String) -> Result<(), TutelaError> {
        self.dextera
            .ban(subject_id, reason, AUTOMATED_RESPONSE_ACTOR, false, ip_hash)
            .await
            .map_err(|e: DexteraError| TutelaError::Upstream(e.to_string()))
    }
}

/// Concrete detector instantiation `apps/gateway` and `apps/watchdog`
/// depend on.
pub type MemDetector = custodes_tutela::Detector<
    MemSignalStore,
    MemRuleStore,
    MemIncidentStore,
    TutelaLedgerSink,
    TutelaRegistrySink,
    TutelaDexteraBanSink,
>;
