// [libs/infra/store/src/dextera.rs]
/*!
 * APARATO: DEXTERA IN-MEMORY STORES Y PUENTE HACIA OBSIDIAN
 * CLASIFICACIÓN: INFRA ADAPTERS (ESTRATO L3)
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use custodes_dextera::errors::DexteraError;
use custodes_dextera::store::{BehavioralSignals, DexteraObsidianSink, InstitutionStore, RevocationStore, SubjectStore, TrustSignalStore};
use custodes_domain_models::{CommitEventRequest, CommitResult, Institution, Subject};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::obsidian::MemLedger;

#[derive(Default)]
pub struct MemSubjectStore {
    subjects: RwLock<HashMap<Uuid, Subject>>,
}

#[async_trait]
impl SubjectStore for MemSubjectStore {
    async fn get(&self, subject_id: Uuid) -> Result<Option<Subject>, DexteraError> {
        Ok(self.subjects.read().await.get(&subject_id).cloned())
    }

    async fn upsert(&self, subject: Subject) -> Result<(), DexteraError> {
        self.subjects.write().await.insert(subject.id, subject);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemInstitutionStore {
    institutions: RwLock<HashMap<Uuid, Institution>>,
}

#[async_trait]
impl InstitutionStore for MemInstitutionStore {
    async fn get(&self, institution_id: Uuid) -> Result<Option<Institution>, DexteraError> {
        Ok(self.institutions.read().await.get(&institution_id).cloned())
    }

    async fn find_by_email_domain(&self, email: &str) -> Result<Option<Institution>, DexteraError> {
        Ok(self.institutions.read().await.values().find(|i| i.allows_email(email)).cloned())
    }
}

impl MemInstitutionStore {
    pub async fn seed(&self, institution: Institution) {
        self.institutions.write().await.insert(institution.id, institution);
    }
}

#[derive(Default)]
struct RevocationRecord {
    reason: String,
    ttl_seconds: i64,
    revoked_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Default)]
pub struct MemRevocationStore {
    revoked: RwLock<HashMap<Uuid, RevocationRecord>>,
    issued_by_subject: RwLock<HashMap<Uuid, Vec<Uuid>>>,
}

#[async_trait]
impl RevocationStore for MemRevocationStore {
    async fn revoke(&self, passport_id: Uuid, reason: String, ttl_seconds: i64) -> Result<(), DexteraError> {
        self.revoked.write().await.insert(passport_id, RevocationRecord { reason, ttl_seconds, revoked_at: chrono::Utc::now() });
        Ok(())
    }

    async fn is_revoked(&self, passport_id: Uuid) -> Result<bool, DexteraError> {
        let revoked = self.revoked.read().await;
        let Some(record) = revoked.get(&passport_id) else { return Ok(false) };
        let expires_at = record.revoked_at + chrono::Duration::seconds(record.ttl_seconds);
        Ok(chrono::Utc::now() < expires_at)
    }

    async fn revoke_all_for_subject(&self, subject_id: Uuid, reason: String, ttl_seconds: i64) -> Result<(), DexteraError> {
        let jtis = self.issued_by_subject.read().await.get(&subject_id).cloned().unwrap_or_default();
        let mut revoked = self.revoked.write().await;
        for jti in jtis {
            revoked.insert(jti, RevocationRecord { reason: reason.clone(), ttl_seconds, revoked_at: chrono::Utc::now() });
        }
        Ok(())
    }

    async fn register_issued(&self, subject_id: Uuid, passport_id: Uuid) -> Result<(), DexteraError> {
        self.issued_by_subject.write().await.entry(subject_id).or_default().push(passport_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemTrustSignalStore {
    signals: RwLock<HashMap<Uuid, BehavioralSignals>>,
}

#[async_trait]
impl TrustSignalStore for MemTrustSignalStore {
    async fn get_behavioral_signals(&self, subject_id: Uuid) -> Result<BehavioralSignals, DexteraError> {
        Ok(self.signals.read().await.get(&subject_id).cloned().unwrap_or_default())
    }
}

impl MemTrustSignalStore {
    pub async fn seed(&self, subject_id: Uuid, signals: BehavioralSignals) {
        self.signals.write().await.insert(subject_id, signals);
    }
}

/// Wraps the shared ledger so Dextera can emit without depending on
/// `custodes-obsidian` directly.
pub struct DexteraLedgerSink {
    ledger: Arc<MemLedger>,
}

impl DexteraLedgerSink {
    pub fn new(ledger: Arc<MemLedger>) -> Self {
        Self { ledger }
    }
}

/// Concrete passport engine instantiation Tutela's ban sink and the
/// gateway handlers depend on.
pub type MemDextera = custodes_dextera::Dextera<MemSubjectStore, MemInstitutionStore, MemRevocationStore, MemTrustSignalStore, DexteraLedgerSink>;

#[async_trait]
impl DexteraObsidianSink for DexteraLedgerSink {
    async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, DexteraError> {
        self.ledger.commit(request).await.map_err(|e| DexteraError::Upstream(e.to_string()))
    }
}
