// [libs/domain/obsidian/src/errors.rs]
//! Obsidian's error surface: the `ChainFault` family plus the transport
//! faults that can occur while the store is reached over I/O.

use thiserror::Error;

pub use custodes_core_hashchain::ChainFault;

#[derive(Error, Debug, Clone)]
pub enum ObsidianError {
    #[error(transparent)]
    Chain(#[from] ChainFault),

    #[error("[OBSIDIAN_UPSTREAM_UNAVAILABLE]: {0}")]
    Upstream(String),

    #[error("[OBSIDIAN_NOT_FOUND]: {0}")]
    NotFound(String),
}
