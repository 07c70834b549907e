// [libs/domain/atlas/src/errors.rs]
//! Atlas's error surface: the `ResourceFault` family plus the transport
//! faults that surface while node/GPU/allocation stores are reached
//! over I/O.

use thiserror::Error;

pub use custodes_domain_models::errors::ResourceFault;

#[derive(Error, Debug, Clone)]
pub enum AtlasError {
    #[error(transparent)]
    Resource(#[from] ResourceFault),

    #[error("[ATLAS_UPSTREAM_UNAVAILABLE]: {0}")]
    Upstream(String),
}
