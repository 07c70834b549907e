// [libs/domain/tutela/src/errors.rs]
//! Tutela's error surface: the `RuleFault`/`ResourceFault` families plus
//! the transport faults that surface while the signal/rule/incident
//! stores, and the Atlas/Dextera sinks, are reached over I/O.

use thiserror::Error;

pub use custodes_domain_models::errors::{ResourceFault, RuleFault};

#[derive(Error, Debug, Clone)]
pub enum TutelaError {
    #[error(transparent)]
    Rule(#[from] RuleFault),

    #[error(transparent)]
    Resource(#[from] ResourceFault),

    #[error("[TUTELA_UPSTREAM_UNAVAILABLE]: {0}")]
    Upstream(String),

    #[error("[TUTELA_HALT_DISABLED]: emergency halt is disabled for this instance")]
    HaltDisabled,
}
