// [libs/domain/models/src/errors.rs]
//! The shared, surface-level error taxonomy every pillar's errors wrap.
//! Each pillar crate re-exports the variant
//! family it owns; this module is the single shared definition so the
//! gateway can map every fault to an HTTP status without re-deriving
//! the taxonomy per crate.

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityFault {
    #[error("[IDENTITY_UNAUTHENTICATED]: no valid credential presented")]
    Unauthenticated,
    #[error("[IDENTITY_BANNED]: subject {0} is banned")]
    Banned(Uuid),
    #[error("[IDENTITY_NOT_FOUND]: subject {0} not found")]
    NotFound(Uuid),
    #[error("[IDENTITY_INVALID_PROVIDER]: provider claims could not be resolved")]
    InvalidProvider,
    #[error("[IDENTITY_TOKEN_EXPIRED]: passport token has expired")]
    TokenExpired,
    #[error("[IDENTITY_TOKEN_INVALID]: passport token signature or shape is invalid")]
    TokenInvalid,
    #[error("[IDENTITY_TOKEN_REVOKED]: passport {0} has been revoked")]
    TokenRevoked(Uuid),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationFault {
    #[error("[AUTHZ_DENIED]: {reason}")]
    Denied { reason: String },
    #[error("[AUTHZ_STEP_UP_REQUIRED]: method={method}")]
    StepUpRequired { method: String },
    #[error("[AUTHZ_REVIEW_REQUIRED]")]
    ReviewRequired,
    #[error("[AUTHZ_RATE_LIMITED]: retry_after={retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceFault {
    #[error("[RESOURCE_NOT_FOUND]: {0}")]
    NotFound(String),
    #[error("[RESOURCE_CONFLICT]: {0}")]
    Conflict(String),
    #[error("[RESOURCE_PRECONDITION]: {0}")]
    Precondition(String),
    #[error("[RESOURCE_DISCOVERY_EMPTY]: no candidate satisfied the discovery criteria")]
    DiscoveryEmpty,
}

// `ChainFault` lives in `custodes-core-hashchain`; re-exported here so
// callers that only depend on the model crate still see the full
// taxonomy under one namespace.
pub use custodes_core_hashchain::ChainFault;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleFault {
    #[error("[RULE_NOT_FOUND]: {0}")]
    RuleNotFound(Uuid),
    #[error("[RULE_VERSION_INVALID]: {0}")]
    RuleVersionInvalid(String),
    #[error("[RULE_CONFIG_MALFORMED]: {0}")]
    ConfigMalformed(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportFault {
    #[error("[TRANSPORT_UPSTREAM_UNAVAILABLE]: {0}")]
    Upstream(String),
    #[error("[TRANSPORT_TIMEOUT]")]
    Timeout,
    #[error("[TRANSPORT_CANCELLED]")]
    Cancelled,
}
