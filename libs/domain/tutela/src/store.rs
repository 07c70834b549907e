// [libs/domain/tutela/src/store.rs]
/*!
 * APARATO: TUTELA STORE & SINK CONTRACTS
 * CLASIFICACIÓN: STORE ABSTRACTIONS (ESTRATO L2)
 * RESPONSABILIDAD: PUERTOS DE PERSISTENCIA Y PUENTES NARROW HACIA
 * OBSIDIAN, ATLAS Y DEXTERA
 *
 * Tutela never imports `custodes-obsidian`, `custodes-atlas`, or
 * `custodes-dextera` directly — it declares the narrow interface it
 * needs from each and `libs/infra/store` implements the trait by
 * wrapping the live pillar. This keeps the five pillars free of cyclic
 * crate dependencies while still letting Tutela kill jobs, suspend
 * nodes, and ban subjects.
 */

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use custodes_domain_models::{
    CommitEventRequest, CommitResult, DetectionRule, EvidencePackage, Incident, RuntimeSignals,
};
use uuid::Uuid;

use crate::errors::TutelaError;

#[async_trait]
pub trait SignalStore: Send + Sync {
    async fn record(&self, signals: RuntimeSignals) -> Result<(), TutelaError>;
    /// Every sample recorded for `node_id` with `observed_at` within
    /// `since` of now, newest last.
    async fn window(&self, node_id: Uuid, since: DateTime<Utc>) -> Result<Vec<RuntimeSignals>, TutelaError>;
}

#[async_trait]
pub trait RuleStore: Send + Sync {
    async fn get(&self, rule_id: Uuid) -> Result<Option<DetectionRule>, TutelaError>;
    async fn upsert(&self, rule: DetectionRule) -> Result<(), TutelaError>;
    async fn list_active(&self) -> Result<Vec<DetectionRule>, TutelaError>;
}

#[async_trait]
pub trait IncidentStore: Send + Sync {
    async fn get(&self, incident_id: Uuid) -> Result<Option<Incident>, TutelaError>;
    async fn upsert(&self, incident: Incident) -> Result<(), TutelaError>;
    async fn list_active_for_node(&self, node_id: Uuid) -> Result<Vec<Incident>, TutelaError>;
}

#[async_trait]
pub trait TutelaObsidianSink: Send + Sync {
    async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, TutelaError>;
    /// Seals the ledger entries already recorded against `job_id` into a
    /// signed evidence package, for capture before a destructive response
    /// acts on the job.
    async fn generate_evidence(&self, job_id: Uuid) -> Result<EvidencePackage, TutelaError>;
}

/// Narrow view onto Atlas's routing surface: enough to kill a single
/// allocation or take an entire node offline, nothing more.
#[async_trait]
pub trait TutelaAtlasSink: Send + Sync {
    /// Releases the allocation backing `job_id` with a `Failed` final
    /// status. Tutela only ever knows the job it is watching, not the
    /// allocation id, so the adapter resolves that mapping.
    async fn kill_job(&self, job_id: Uuid, ip_hash: String) -> Result<(), TutelaError>;
    async fn suspend_node(&self, node_id: Uuid, ip_hash: String) -> Result<Vec<Uuid>, TutelaError>;
}

/// Narrow view onto Dextera's identity surface: just enough to ban the
/// subject behind a KILL_AND_BAN response.
#[async_trait]
pub trait TutelaDexteraSink: Send + Sync {
    async fn ban(&self, subject_id: Uuid, reason: String, ip_hash: String) -> Result<(), TutelaError>;
}
