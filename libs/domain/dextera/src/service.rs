// [libs/domain/dextera/src/service.rs]
/*!
 * APARATO: PASSPORT ENGINE
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: EMISIÓN, VERIFICACIÓN, REVOCACIÓN Y BANEO DE IDENTIDAD
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use custodes_domain_models::errors::IdentityFault;
use custodes_domain_models::{
    ClearanceLevel, CommitEventRequest, EventType, IssueRequest, Passport, ProviderClaims, Severity,
    Subject, SubjectType, VerifyResult,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::PassportConfig;
use crate::errors::DexteraError;
use crate::store::{BehavioralSignals, DexteraObsidianSink, InstitutionStore, RevocationStore, SubjectStore, TrustSignalStore};
use crate::token::{self, PassportClaims};
use crate::trust::{compute_trust_score, TrustScoreResult, TrustSignals};

pub struct Dextera<Su, Inst, Rev, Sig, Sink>
where
    Su: SubjectStore,
    Inst: InstitutionStore,
    Rev: RevocationStore,
    Sig: TrustSignalStore,
    Sink: DexteraObsidianSink,
{
    subjects: Arc<Su>,
    institutions: Arc<Inst>,
    revocations: Arc<Rev>,
    signals: Arc<Sig>,
    ledger: Arc<Sink>,
    config: PassportConfig,
}

impl<Su, Inst, Rev, Sig, Sink> Dextera<Su, Inst, Rev, Sig, Sink>
where
    Su: SubjectStore,
    Inst: InstitutionStore,
    Rev: RevocationStore,
    Sig: TrustSignalStore,
    Sink: DexteraObsidianSink,
{
    pub fn new(subjects: Arc<Su>, institutions: Arc<Inst>, revocations: Arc<Rev>, signals: Arc<Sig>, ledger: Arc<Sink>, config: PassportConfig) -> Self {
        Self { subjects, institutions, revocations, signals, ledger, config }
    }

    /// Resolves clearance from the provider, extracts institutional
    /// claims, computes the trust score, and issues a signed passport.
    #[instrument(skip(self, request), fields(subject_id = %request.subject_id))]
    pub async fn issue(&self, request: IssueRequest, ip_hash: String) -> Result<Passport, DexteraError> {
        let subject = self
            .subjects
            .get(request.subject_id)
            .await?
            .ok_or(IdentityFault::NotFound(request.subject_id))?;

        if !subject.can_receive_passport() {
            return Err(IdentityFault::Banned(subject.id).into());
        }

        let clearance = request.identity_provider.resolves_clearance();

        let institution_id = self.resolve_institution_hint(&request.provider_claims, &subject).await?;
        let institution_verified = match institution_id {
            Some(id) => self.institutions.get(id).await?.map(|inst| inst.is_approved).unwrap_or(false),
            None => false,
        };

        let behavioral = self.signals.get_behavioral_signals(subject.id).await?;
        let account_age_days = (Utc::now() - subject.created_at).num_days().max(0) as f64;

        let trust_signals = TrustSignals {
            identity_verified: true,
            mfa_verified: request.mfa_verified,
            device_bound: request.device_id.is_some(),
            institution_verified,
            account_age_days,
            login_consistency: behavioral.login_consistency,
            fraud_flagged: behavioral.fraud_flagged,
            abuse_flagged: behavioral.abuse_flagged,
            job_completion_rate: behavioral.job_completion_rate,
            payment_health: behavioral.payment_health,
        };
        let trust_result = compute_trust_score(&trust_signals);

        let mut updated_subject = subject.clone();
        updated_subject.trust_score = trust_result.score;
        updated_subject.updated_at = Utc::now();
        self.subjects.upsert(updated_subject).await?;

        let (min_ttl, max_ttl) = PassportConfig::passport_ttl_bounds_seconds();
        let ttl_seconds = self.config.passport_ttl_seconds.clamp(min_ttl, max_ttl);
        let issued_at = Utc::now();
        let expires_at = issued_at + Duration::seconds(ttl_seconds);

        let passport_id = Uuid::new_v4();
        let mut passport = Passport {
            passport_id,
            subject_id: subject.id,
            subject_type: subject.subject_type,
            clearance_level: clearance.max(subject.clearance_level),
            institution_id,
            trust_score: trust_result.score,
            identity_provider: request.identity_provider,
            mfa_verified: request.mfa_verified,
            device_bound: request.device_id.is_some(),
            device_id: request.device_id,
            issued_at,
            expires_at,
            signature: String::new(),
        };

        let token = token::encode_passport(&passport, &self.config).map_err(DexteraError::from)?;
        passport.signature = token;

        self.revocations.register_issued(subject.id, passport_id).await?;

        let mut metadata = BTreeMap::new();
        metadata.insert("identity_provider".to_string(), format!("{:?}", passport.identity_provider));
        metadata.insert("trust_score".to_string(), trust_result.score.to_string());
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::PassportIssued,
                severity: Some(Severity::Info),
                subject_id: subject.id,
                passport_id: Some(passport_id),
                institution_id,
                target_id: Some(passport_id.to_string()),
                target_type: Some("passport".to_string()),
                metadata,
                ip_hash,
                region: None,
            })
            .await?;

        info!(passport_id = %passport_id, trust_score = trust_result.score, "passport issued");
        Ok(passport)
    }

    async fn resolve_institution_hint(&self, claims: &ProviderClaims, subject: &Subject) -> Result<Option<Uuid>, DexteraError> {
        if let Some(hint) = &claims.institution_hint {
            if let Some(institution) = self.institutions.find_by_email_domain(hint).await? {
                return Ok(Some(institution.id));
            }
        }
        if !claims.email.is_empty() {
            if let Some(institution) = self.institutions.find_by_email_domain(&claims.email).await? {
                return Ok(Some(institution.id));
            }
        }
        Ok(subject.institution_id)
    }

    /// Validates signature, issuer, expected audience, expiry,
    /// revocation, and ban status, in that order.
    #[instrument(skip(self, token))]
    pub async fn verify(&self, token: &str, expected_audience: Option<&str>) -> VerifyResult {
        let claims = match token::decode_passport(token, &self.config, expected_audience) {
            Ok(claims) => claims,
            Err(fault) => return VerifyResult { valid: false, passport: None, error: Some(fault.to_string()) },
        };

        match self.revocations.is_revoked(claims.jti).await {
            Ok(true) => {
                return VerifyResult {
                    valid: false,
                    passport: None,
                    error: Some(IdentityFault::TokenRevoked(claims.jti).to_string()),
                }
            }
            Ok(false) => {}
            Err(err) => return VerifyResult { valid: false, passport: None, error: Some(err.to_string()) },
        }

        let subject = match self.subjects.get(claims.sub).await {
            Ok(Some(subject)) => subject,
            Ok(None) => {
                return VerifyResult { valid: false, passport: None, error: Some(IdentityFault::NotFound(claims.sub).to_string()) }
            }
            Err(err) => return VerifyResult { valid: false, passport: None, error: Some(err.to_string()) },
        };

        if subject.is_banned {
            return VerifyResult { valid: false, passport: None, error: Some(IdentityFault::Banned(subject.id).to_string()) };
        }

        let passport = passport_from_claims(&claims, token);
        VerifyResult { valid: true, passport: Some(passport), error: None }
    }

    #[instrument(skip(self))]
    pub async fn revoke(&self, passport_id: Uuid, reason: String, by: Uuid, ip_hash: String) -> Result<(), DexteraError> {
        let (_, max_ttl) = PassportConfig::passport_ttl_bounds_seconds();
        self.revocations.revoke(passport_id, reason.clone(), max_ttl).await?;

        let mut metadata = BTreeMap::new();
        metadata.insert("reason".to_string(), reason);
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::PassportRevoked,
                severity: Some(Severity::Info),
                subject_id: by,
                passport_id: Some(passport_id),
                institution_id: None,
                target_id: Some(passport_id.to_string()),
                target_type: Some("passport".to_string()),
                metadata,
                ip_hash,
                region: None,
            })
            .await?;
        Ok(())
    }

    /// Revokes every active passport for `subject_id` and bans the
    /// subject. Calling this twice is a no-op at the subject store — the
    /// subject is already banned the second time through.
    #[instrument(skip(self))]
    pub async fn ban(&self, subject_id: Uuid, reason: String, by: Uuid, notify_institution: bool, ip_hash: String) -> Result<(), DexteraError> {
        let mut subject = self
            .subjects
            .get(subject_id)
            .await?
            .ok_or(IdentityFault::NotFound(subject_id))?;

        let already_banned = subject.is_banned;

        let (_, max_ttl) = PassportConfig::passport_ttl_bounds_seconds();
        self.revocations.revoke_all_for_subject(subject_id, reason.clone(), max_ttl).await?;

        subject.is_banned = true;
        subject.updated_at = Utc::now();
        self.subjects.upsert(subject).await?;

        if already_banned {
            warn!(subject_id = %subject_id, "ban on an already-banned subject; treated as idempotent");
        }

        let mut metadata = BTreeMap::new();
        metadata.insert("reason".to_string(), reason);
        metadata.insert("notify_institution".to_string(), notify_institution.to_string());
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::SubjectBanned,
                severity: Some(Severity::Security),
                subject_id: by,
                passport_id: None,
                institution_id: None,
                target_id: Some(subject_id.to_string()),
                target_type: Some("subject".to_string()),
                metadata,
                ip_hash,
                region: None,
            })
            .await?;
        Ok(())
    }

    pub async fn trust_score(&self, subject_id: Uuid) -> Result<TrustScoreResult, DexteraError> {
        let subject = self.subjects.get(subject_id).await?.ok_or(IdentityFault::NotFound(subject_id))?;
        let behavioral = self.signals.get_behavioral_signals(subject_id).await?;
        let account_age_days = (Utc::now() - subject.created_at).num_days().max(0) as f64;
        let trust_signals = TrustSignals {
            identity_verified: true,
            mfa_verified: false,
            device_bound: false,
            institution_verified: subject.institution_id.is_some(),
            account_age_days,
            login_consistency: behavioral.login_consistency,
            fraud_flagged: behavioral.fraud_flagged,
            abuse_flagged: behavioral.abuse_flagged,
            job_completion_rate: behavioral.job_completion_rate,
            payment_health: behavioral.payment_health,
        };
        Ok(compute_trust_score(&trust_signals))
    }

    /// Verifies the email domain against the institution's allow list,
    /// maps the affiliation claim to a subject type, and provisions a
    /// new institutional subject at clearance INSTITUTIONAL.
    #[instrument(skip(self, claims))]
    pub async fn resolve_sso(&self, claims: ProviderClaims, institution_id: Uuid) -> Result<Subject, DexteraError> {
        let institution = self
            .institutions
            .get(institution_id)
            .await?
            .ok_or(IdentityFault::NotFound(institution_id))?;

        if !institution.allows_email(&claims.email) {
            return Err(IdentityFault::InvalidProvider.into());
        }

        let subject_type = map_affiliation(claims.edu_person_affiliation.as_deref());
        let now = Utc::now();
        let subject = Subject {
            id: Uuid::new_v4(),
            subject_type,
            clearance_level: ClearanceLevel::Institutional,
            email: claims.email.clone(),
            display_name: claims.email.split('@').next().unwrap_or(&claims.email).to_string(),
            institution_id: Some(institution_id),
            org_id: None,
            trust_score: 60,
            is_active: true,
            is_banned: false,
            created_at: now,
            updated_at: now,
        };
        self.subjects.upsert(subject.clone()).await?;
        Ok(subject)
    }
}

fn map_affiliation(affiliation: Option<&str>) -> SubjectType {
    match affiliation.map(str::to_ascii_lowercase).as_deref() {
        Some("student") => SubjectType::Student,
        Some("faculty") | Some("staff") => SubjectType::Faculty,
        _ => SubjectType::Researcher,
    }
}

fn passport_from_claims(claims: &PassportClaims, token: &str) -> Passport {
    Passport {
        passport_id: claims.jti,
        subject_id: claims.sub,
        subject_type: claims.sty,
        clearance_level: claims.clr,
        institution_id: claims.institution_id,
        trust_score: claims.trs,
        identity_provider: claims.idp,
        mfa_verified: claims.mfa,
        device_bound: claims.dev,
        device_id: claims.device_id.clone(),
        issued_at: token::from_timestamp(claims.iat).unwrap_or_else(Utc::now),
        expires_at: token::from_timestamp(claims.exp).unwrap_or_else(Utc::now),
        signature: token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SigningAlgorithm;
    use crate::errors::DexteraError;
    use custodes_domain_models::{IdentityProvider, Institution, SsoKind};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::RwLock;

    #[derive(Default)]
    struct MemSubjects {
        rows: RwLock<HashMap<Uuid, Subject>>,
    }
    #[async_trait::async_trait]
    impl SubjectStore for MemSubjects {
        async fn get(&self, subject_id: Uuid) -> Result<Option<Subject>, DexteraError> {
            Ok(self.rows.read().await.get(&subject_id).cloned())
        }
        async fn upsert(&self, subject: Subject) -> Result<(), DexteraError> {
            self.rows.write().await.insert(subject.id, subject);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemInstitutions {
        rows: RwLock<HashMap<Uuid, Institution>>,
    }
    #[async_trait::async_trait]
    impl InstitutionStore for MemInstitutions {
        async fn get(&self, institution_id: Uuid) -> Result<Option<Institution>, DexteraError> {
            Ok(self.rows.read().await.get(&institution_id).cloned())
        }
        async fn find_by_email_domain(&self, email: &str) -> Result<Option<Institution>, DexteraError> {
            Ok(self.rows.read().await.values().find(|i| i.allows_email(email)).cloned())
        }
    }

    #[derive(Default)]
    struct MemRevocations {
        revoked: RwLock<HashMap<Uuid, String>>,
        by_subject: RwLock<HashMap<Uuid, Vec<Uuid>>>,
    }
    #[async_trait::async_trait]
    impl RevocationStore for MemRevocations {
        async fn revoke(&self, passport_id: Uuid, reason: String, _ttl_seconds: i64) -> Result<(), DexteraError> {
            self.revoked.write().await.insert(passport_id, reason);
            Ok(())
        }
        async fn is_revoked(&self, passport_id: Uuid) -> Result<bool, DexteraError> {
            Ok(self.revoked.read().await.contains_key(&passport_id))
        }
        async fn revoke_all_for_subject(&self, subject_id: Uuid, reason: String, ttl_seconds: i64) -> Result<(), DexteraError> {
            let ids = self.by_subject.read().await.get(&subject_id).cloned().unwrap_or_default();
            for id in ids {
                self.revoke(id, reason.clone(), ttl_seconds).await?;
            }
            Ok(())
        }
        async fn register_issued(&self, subject_id: Uuid, passport_id: Uuid) -> Result<(), DexteraError> {
            self.by_subject.write().await.entry(subject_id).or_default().push(passport_id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemSignals;
    #[async_trait::async_trait]
    impl TrustSignalStore for MemSignals {
        async fn get_behavioral_signals(&self, _subject_id: Uuid) -> Result<BehavioralSignals, DexteraError> {
            Ok(BehavioralSignals { fraud_flagged: false, abuse_flagged: false, login_consistency: 0.8, job_completion_rate: 0.9, payment_health: 1.0 })
        }
    }

    #[derive(Default)]
    struct MemLedger {
        commits: AtomicU64,
    }
    #[async_trait::async_trait]
    impl DexteraObsidianSink for MemLedger {
        async fn emit(&self, _request: CommitEventRequest) -> Result<custodes_domain_models::CommitResult, DexteraError> {
            let index = self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(custodes_domain_models::CommitResult {
                entry_id: Uuid::new_v4(),
                block_index: index,
                block_hash: "stub".to_string(),
                timestamp: Utc::now(),
            })
        }
    }

    fn config() -> PassportConfig {
        PassportConfig { signing_key_pem: b"test-key".to_vec(), verifying_key_pem: b"test-key".to_vec(), algorithm: SigningAlgorithm::Hs256, ..PassportConfig::default() }
    }

    fn engine() -> (Dextera<MemSubjects, MemInstitutions, MemRevocations, MemSignals, MemLedger>, Arc<MemSubjects>, Arc<MemInstitutions>) {
        let subjects = Arc::new(MemSubjects::default());
        let institutions = Arc::new(MemInstitutions::default());
        let revocations = Arc::new(MemRevocations::default());
        let signals = Arc::new(MemSignals);
        let ledger = Arc::new(MemLedger::default());
        (
            Dextera::new(subjects.clone(), institutions.clone(), revocations, signals, ledger, config()),
            subjects,
            institutions,
        )
    }

    fn active_subject(id: Uuid) -> Subject {
        let now = Utc::now() - Duration::days(400);
        Subject {
            id,
            subject_type: SubjectType::Researcher,
            clearance_level: ClearanceLevel::Email,
            email: "alice@example.com".to_string(),
            display_name: "Alice".to_string(),
            institution_id: None,
            org_id: None,
            trust_score: 0,
            is_active: true,
            is_banned: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn issue_then_verify_round_trips() {
        let (engine, subjects, _institutions) = engine();
        let subject_id = Uuid::new_v4();
        subjects.upsert(active_subject(subject_id)).await.unwrap();

        let passport = engine
            .issue(
                IssueRequest {
                    subject_id,
                    identity_provider: IdentityProvider::EmailMagic,
                    provider_claims: ProviderClaims { email: "alice@example.com".to_string(), ..Default::default() },
                    device_id: None,
                    mfa_verified: false,
                },
                "iphash".to_string(),
            )
            .await
            .unwrap();

        let result = engine.verify(&passport.signature, None).await;
        assert!(result.valid);
        assert_eq!(result.passport.unwrap().subject_id, subject_id);
    }

    #[tokio::test]
    async fn banned_subject_cannot_be_issued_a_passport() {
        let (engine, subjects, _institutions) = engine();
        let subject_id = Uuid::new_v4();
        let mut subject = active_subject(subject_id);
        subject.is_banned = true;
        subjects.upsert(subject).await.unwrap();

        let result = engine
            .issue(
                IssueRequest {
                    subject_id,
                    identity_provider: IdentityProvider::EmailMagic,
                    provider_claims: ProviderClaims { email: "alice@example.com".to_string(), ..Default::default() },
                    device_id: None,
                    mfa_verified: false,
                },
                "iphash".to_string(),
            )
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn revoke_then_verify_never_passes() {
        let (engine, subjects, _institutions) = engine();
        let subject_id = Uuid::new_v4();
        subjects.upsert(active_subject(subject_id)).await.unwrap();

        let passport = engine
            .issue(
                IssueRequest {
                    subject_id,
                    identity_provider: IdentityProvider::EmailMagic,
                    provider_claims: ProviderClaims { email: "alice@example.com".to_string(), ..Default::default() },
                    device_id: None,
                    mfa_verified: false,
                },
                "iphash".to_string(),
            )
            .await
            .unwrap();

        engine.revoke(passport.passport_id, "compromised".to_string(), Uuid::new_v4(), "iphash".to_string()).await.unwrap();
        let result = engine.verify(&passport.signature, None).await;
        assert!(!result.valid);
    }

    #[tokio::test]
    async fn ban_revokes_every_active_passport_for_the_subject() {
        let (engine, subjects, _institutions) = engine();
        let subject_id = Uuid::new_v4();
        subjects.upsert(active_subject(subject_id)).await.unwrap();

        let passport = engine
            .issue(
                IssueRequest {
                    subject_id,
                    identity_provider: IdentityProvider::EmailMagic,
                    provider_claims: ProviderClaims { email: "alice@example.com".to_string(), ..Default::default() },
                    device_id: None,
                    mfa_verified: false,
                },
                "iphash".to_string(),
            )
            .await
            .unwrap();

        engine.ban(subject_id, "abuse".to_string(), Uuid::new_v4(), false, "iphash".to_string()).await.unwrap();
        let result = engine.verify(&passport.signature, None).await;
        assert!(!result.valid);

        // Second ban call is a no-op at the subject store.
        engine.ban(subject_id, "abuse again".to_string(), Uuid::new_v4(), false, "iphash".to_string()).await.unwrap();
        let subject = subjects.get(subject_id).await.unwrap().unwrap();
        assert!(subject.is_banned);
    }

    #[tokio::test]
    async fn sso_resolution_rejects_unaffiliated_email_domain() {
        let (engine, _subjects, institutions) = engine();
        let institution_id = Uuid::new_v4();
        institutions.rows.write().await.insert(
            institution_id,
            Institution {
                id: institution_id,
                name: "State University".to_string(),
                sso_kind: SsoKind::Saml,
                sso_endpoint: "https://sso.example.edu".to_string(),
                allowed_email_domains: vec!["example.edu".to_string()],
                is_approved: true,
                admin_contact_email: "admin@example.edu".to_string(),
            },
        );

        let result = engine
            .resolve_sso(ProviderClaims { email: "eve@unrelated.com".to_string(), ..Default::default() }, institution_id)
            .await;
        assert!(result.is_err());
    }
}
