// [libs/domain/aedituus/src/store.rs]
/*!
 * APARATO: AEDITUUS STORE & SINK CONTRACTS
 * CLASIFICACIÓN: STORE ABSTRACTIONS (ESTRATO L2)
 * RESPONSABILIDAD: PUERTOS DE PERSISTENCIA Y EMISIÓN HACIA EL LEDGER
 *
 * `AedituusObsidianSink` mirrors Dextera's sink pattern: Aedituus never
 * imports `custodes-obsidian`, only this narrow trait, wired at the
 * infrastructure layer.
 */

use async_trait::async_trait;
use custodes_domain_models::{CommitEventRequest, CommitResult, Policy, PolicyScope};
use uuid::Uuid;

use crate::errors::AedituusError;

#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn get_policy(&self, scope: PolicyScope, scope_id: Option<Uuid>) -> Result<Option<Policy>, AedituusError>;
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitOutcome {
    pub allowed: bool,
    pub retry_after_seconds: Option<u64>,
}

/// Atomic fixed-window counter keyed `ratelimit:{scope}:{id}:{action}`.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    async fn check_and_increment(&self, key: &str, window_seconds: u64, max_requests: u64) -> Result<RateLimitOutcome, AedituusError>;
}

#[async_trait]
pub trait AedituusObsidianSink: Send + Sync {
    async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, AedituusError>;
}
