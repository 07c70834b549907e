// [libs/domain/dextera/tests/integration.rs]
//! Exercises Dextera against the real in-memory store adapters from
//! `custodes-infra-store` rather than crate-local mocks, covering the
//! passport lifecycle invariants from the testable-properties list: no
//! passport verifies both before issue and after revoke, and `ban`
//! applied twice is a no-op at the subject store the second time.

use std::sync::Arc;

use chrono::Utc;
use custodes_dextera::config::PassportConfig;
use custodes_dextera::store::SubjectStore;
use custodes_dextera::Dextera;
use custodes_domain_models::{ClearanceLevel, IdentityProvider, IssueRequest, ProviderClaims, Subject, SubjectType};
use custodes_infra_store::dextera::{
    DexteraLedgerSink, MemInstitutionStore, MemRevocationStore, MemSubjectStore, MemTrustSignalStore,
};
use custodes_infra_store::obsidian::{MemDisputeStore, MemLedger, MemLedgerAppendStore, MemMerkleBlockStore, MemSequenceCounter};
use custodes_obsidian::config::LedgerConfig;
use uuid::Uuid;

fn subject(trust_score: u8) -> Subject {
    Subject {
        id: Uuid::new_v4(),
        subject_type: SubjectType::Researcher,
        clearance_level: ClearanceLevel::Institutional,
        email: "researcher@example.edu".to_string(),
        display_name: "Researcher".to_string(),
        institution_id: None,
        org_id: None,
        trust_score,
        is_active: true,
        is_banned: false,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn issue_request(subject_id: Uuid, email: String) -> IssueRequest {
    IssueRequest {
        subject_id,
        identity_provider: IdentityProvider::OidcEdu,
        provider_claims: ProviderClaims {
            institution_hint: None,
            edu_person_affiliation: Some("faculty".to_string()),
            email,
            device_id: None,
        },
        device_id: None,
        mfa_verified: true,
    }
}

#[tokio::test]
async fn revoked_passport_never_verifies_again() {
    let ledger = Arc::new(MemLedger::new(
        Arc::new(MemLedgerAppendStore::default()),
        Arc::new(MemSequenceCounter::default()),
        Arc::new(MemMerkleBlockStore::default()),
        Arc::new(MemDisputeStore::default()),
        LedgerConfig::default(),
    ));

    let subjects = Arc::new(MemSubjectStore::default());
    let subject = subject(60);
    subjects.upsert(subject.clone()).await.unwrap();

    let dextera = Dextera::new(
        subjects,
        Arc::new(MemInstitutionStore::default()),
        Arc::new(MemRevocationStore::default()),
        Arc::new(MemTrustSignalStore::default()),
        Arc::new(DexteraLedgerSink::new(ledger)),
        PassportConfig::default(),
    );

    let passport = dextera.issue(issue_request(subject.id, subject.email.clone()), "iphash".to_string()).await.unwrap();

    let before = dextera.verify(&passport.signature, None).await;
    assert!(before.valid, "a freshly issued passport must verify: {:?}", before.error);

    dextera.revoke(passport.passport_id, "compromised device".to_string(), subject.id, "iphash".to_string()).await.unwrap();

    let after = dextera.verify(&passport.signature, None).await;
    assert!(!after.valid, "a revoked passport must never verify again");
}

#[tokio::test]
async fn banning_an_already_banned_subject_is_a_no_op() {
    let ledger = Arc::new(MemLedger::new(
        Arc::new(MemLedgerAppendStore::default()),
        Arc::new(MemSequenceCounter::default()),
        Arc::new(MemMerkleBlockStore::default()),
        Arc::new(MemDisputeStore::default()),
        LedgerConfig::default(),
    ));

    let subjects = Arc::new(MemSubjectStore::default());
    let subject = subject(60);
    subjects.upsert(subject.clone()).await.unwrap();

    let dextera = Dextera::new(
        subjects.clone(),
        Arc::new(MemInstitutionStore::default()),
        Arc::new(MemRevocationStore::default()),
        Arc::new(MemTrustSignalStore::default()),
        Arc::new(DexteraLedgerSink::new(ledger)),
        PassportConfig::default(),
    );

    dextera.ban(subject.id, "first offense".to_string(), subject.id, false, "iphash".to_string()).await.unwrap();
    let once_banned = subjects.get(subject.id).await.unwrap().unwrap();
    assert!(once_banned.is_banned);

    dextera.ban(subject.id, "repeat report".to_string(), subject.id, false, "iphash".to_string()).await.unwrap();
    let twice_banned = subjects.get(subject.id).await.unwrap().unwrap();
    assert!(twice_banned.is_banned, "banning a banned subject must stay a no-op, not error or flip state");
}
