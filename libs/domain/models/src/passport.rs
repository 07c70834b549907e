// [libs/domain/models/src/passport.rs]
//! The short-lived signed identity artifact Dextera issues and every
//! other pillar reads the claims of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::subject::{ClearanceLevel, SubjectType};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdentityProvider {
    EmailMagic,
    OidcEdu,
    SamlEdu,
    Passkey,
    Kyb,
    ApiKey,
}

impl IdentityProvider {
    /// KYB -> ENTERPRISE, OIDC/SAML edu -> INSTITUTIONAL, API_KEY -> ADMIN,
    /// else EMAIL_ONLY (mapped here to `ClearanceLevel::Email`).
    pub fn resolves_clearance(&self) -> ClearanceLevel {
        match self {
            IdentityProvider::Kyb => ClearanceLevel::Enterprise,
            IdentityProvider::OidcEdu | IdentityProvider::SamlEdu => ClearanceLevel::Institutional,
            IdentityProvider::ApiKey => ClearanceLevel::Admin,
            IdentityProvider::EmailMagic | IdentityProvider::Passkey => ClearanceLevel::Email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passport {
    pub passport_id: Uuid,
    pub subject_id: Uuid,
    pub subject_type: SubjectType,
    pub clearance_level: ClearanceLevel,
    pub institution_id: Option<Uuid>,
    pub trust_score: u8,
    pub identity_provider: IdentityProvider,
    pub mfa_verified: bool,
    pub device_bound: bool,
    pub device_id: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Compact signed token rendering of this passport, set once issued.
    pub signature: String,
}

impl Passport {
    pub fn ttl_seconds(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Claims extracted from an identity provider's assertion, used both to
/// resolve clearance and to drive trust-score computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderClaims {
    /// `hd` (Google Workspace) or `schacHomeOrganization` (SAML/eduGAIN).
    pub institution_hint: Option<String>,
    /// `eduPersonAffiliation`, parsed into the allow-listed enum.
    pub edu_person_affiliation: Option<String>,
    pub email: String,
    pub device_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IssueRequest {
    pub subject_id: Uuid,
    pub identity_provider: IdentityProvider,
    pub provider_claims: ProviderClaims,
    pub device_id: Option<String>,
    pub mfa_verified: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResult {
    pub valid: bool,
    pub passport: Option<Passport>,
    pub error: Option<String>,
}
