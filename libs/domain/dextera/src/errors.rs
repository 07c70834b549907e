// [libs/domain/dextera/src/errors.rs]
//! Dextera's error surface: the `IdentityFault` family plus the
//! transport faults that surface while the subject/institution/
//! revocation stores are reached over I/O.

use thiserror::Error;

pub use custodes_domain_models::errors::IdentityFault;

#[derive(Error, Debug, Clone)]
pub enum DexteraError {
    #[error(transparent)]
    Identity(#[from] IdentityFault),

    #[error("[DEXTERA_UPSTREAM_UNAVAILABLE]: {0}")]
    Upstream(String),

    #[error("[DEXTERA_SIGNING_FAULT]: {0}")]
    Signing(String),
}
