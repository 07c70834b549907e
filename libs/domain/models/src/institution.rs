// [libs/domain/models/src/institution.rs]
//! Institutions — the SSO-bearing organizations Dextera trusts to vouch
//! for a subject's academic/enterprise affiliation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SsoKind {
    Oidc,
    Saml,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    pub id: Uuid,
    pub name: String,
    pub sso_kind: SsoKind,
    pub sso_endpoint: String,
    /// Suffix-matchable email domains, e.g. `edu.example.org` matches
    /// `alice@cs.edu.example.org`.
    pub allowed_email_domains: Vec<String>,
    pub is_approved: bool,
    pub admin_contact_email: String,
}

impl Institution {
    /// Exact or suffix match against the allowed domain set.
    pub fn allows_email(&self, email: &str) -> bool {
        let Some(domain) = email.rsplit('@').next() else {
            return false;
        };
        let domain = domain.to_ascii_lowercase();
        self.allowed_email_domains.iter().any(|allowed| {
            let allowed = allowed.to_ascii_lowercase();
            domain == allowed || domain.ends_with(&format!(".{allowed}"))
        })
    }
}
