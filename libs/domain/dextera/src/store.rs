// [libs/domain/dextera/src/store.rs]
/*!
 * APARATO: DEXTERA STORE & SINK CONTRACTS
 * CLASIFICACIÓN: STORE ABSTRACTIONS (ESTRATO L2)
 * RESPONSABILIDAD: PUERTOS DE PERSISTENCIA Y EMISIÓN HACIA EL LEDGER
 *
 * `DexteraObsidianSink` is Dextera's half of the cross-pillar sink
 * pattern from the design notes: Dextera declares the narrow interface
 * it needs from the ledger and never imports `custodes-obsidian`
 * directly. `libs/infra/store` implements this trait by wrapping a
 * live `Ledger`.
 */

use async_trait::async_trait;
use custodes_domain_models::{CommitEventRequest, CommitResult, Institution, Subject};
use uuid::Uuid;

use crate::errors::DexteraError;

#[async_trait]
pub trait SubjectStore: Send + Sync {
    async fn get(&self, subject_id: Uuid) -> Result<Option<Subject>, DexteraError>;
    async fn upsert(&self, subject: Subject) -> Result<(), DexteraError>;
}

#[async_trait]
pub trait InstitutionStore: Send + Sync {
    async fn get(&self, institution_id: Uuid) -> Result<Option<Institution>, DexteraError>;
    /// Finds the institution whose `allowed_email_domains` matches
    /// `email`, used by SSO claim resolution when the provider claim
    /// carries no explicit `institution_hint`.
    async fn find_by_email_domain(&self, email: &str) -> Result<Option<Institution>, DexteraError>;
}

/// TTL-indexed revocation index, keyed `revoked:{passport_id}` per the
/// specification. Only atomic set/check operations are required.
#[async_trait]
pub trait RevocationStore: Send + Sync {
    async fn revoke(&self, passport_id: Uuid, reason: String, ttl_seconds: i64) -> Result<(), DexteraError>;
    async fn is_revoked(&self, passport_id: Uuid) -> Result<bool, DexteraError>;
    /// Revokes every passport issued to `subject_id` that is still
    /// live, used by `ban`. Implementations track the subject -> jti
    /// index themselves (issue() registers into it).
    async fn revoke_all_for_subject(&self, subject_id: Uuid, reason: String, ttl_seconds: i64) -> Result<(), DexteraError>;
    async fn register_issued(&self, subject_id: Uuid, passport_id: Uuid) -> Result<(), DexteraError>;
}

/// Behavioral signals the trust formula needs that don't live on
/// `Subject` itself — account age is derived from `Subject::created_at`
/// directly, but fraud/abuse flags and rolling behavioral rates need
/// their own history.
#[derive(Debug, Clone, Default)]
pub struct BehavioralSignals {
    pub fraud_flagged: bool,
    pub abuse_flagged: bool,
    pub login_consistency: f64,
    pub job_completion_rate: f64,
    pub payment_health: f64,
}

#[async_trait]
pub trait TrustSignalStore: Send + Sync {
    async fn get_behavioral_signals(&self, subject_id: Uuid) -> Result<BehavioralSignals, DexteraError>;
}

#[async_trait]
pub trait DexteraObsidianSink: Send + Sync {
    async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, DexteraError>;
}
