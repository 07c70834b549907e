// [libs/domain/aedituus/src/errors.rs]
//! Aedituus's error surface: the `AuthorizationFault`/`RuleFault`
//! families plus the transport faults that surface while policy, rate
//! limit, and ledger stores are reached over I/O.

use thiserror::Error;

pub use custodes_domain_models::errors::{AuthorizationFault, RuleFault};

#[derive(Error, Debug, Clone)]
pub enum AedituusError {
    #[error(transparent)]
    Authorization(#[from] AuthorizationFault),

    #[error(transparent)]
    Rule(#[from] RuleFault),

    #[error("[AEDITUUS_UPSTREAM_UNAVAILABLE]: {0}")]
    Upstream(String),
}
