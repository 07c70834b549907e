// [libs/infra/store/src/aedituus.rs]
/*!
 * APARATO: AEDITUUS IN-MEMORY STORES Y PUENTE HACIA OBSIDIAN
 * CLASIFICACIÓN: INFRA ADAPTERS (ESTRATO L3)
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use custodes_aedituus::errors::AedituusError;
use custodes_aedituus::store::{AedituusObsidianSink, PolicyStore, RateLimitOutcome, RateLimitStore};
use custodes_domain_models::{CommitEventRequest, CommitResult, Policy, PolicyScope};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::obsidian::MemLedger;

#[derive(Default)]
pub struct MemPolicyStore {
    policies: RwLock<HashMap<(PolicyScopeKey, Option<Uuid>), Policy>>,
}

/// `PolicyScope` doesn't implement `Hash`, so it's mapped to a plain key
/// for the in-memory index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum PolicyScopeKey {
    Subject,
    Institution,
    Org,
    Platform,
}

fn scope_key(scope: PolicyScope) -> PolicyScopeKey {
    match scope {
        PolicyScope::Subject => PolicyScopeKey::Subject,
        PolicyScope::Institution => PolicyScopeKey::Institution,
        PolicyScope::Org => PolicyScopeKey::Org,
        PolicyScope::Platform => PolicyScopeKey::Platform,
    }
}

#[async_trait]
impl PolicyStore for MemPolicyStore {
    async fn get_policy(&self, scope: PolicyScope, scope_id: Option<Uuid>) -> Result<Option<Policy>, AedituusError> {
        Ok(self.policies.read().await.get(&(scope_key(scope), scope_id)).cloned())
    }
}

impl MemPolicyStore {
    pub async fn upsert(&self, policy: Policy) {
        self.policies.write().await.insert((scope_key(policy.scope), policy.scope_id), policy);
    }
}

#[derive(Default)]
struct WindowCounter {
    window_started_at: chrono::DateTime<chrono::Utc>,
    count: u64,
}

#[derive(Default)]
pub struct MemRateLimitStore {
    counters: RwLock<HashMap<String, WindowCounter>>,
}

#[async_trait]
impl RateLimitStore for MemRateLimitStore {
    async fn check_and_increment(&self, key: &str, window_seconds: u64, max_requests: u64) -> Result<RateLimitOutcome, AedituusError> {
        let mut counters = self.counters.write().await;
        let now = chrono::Utc::now();
        let counter = counters.entry(key.to_string()).or_insert_with(|| WindowCounter { window_started_at: now, count: 0 });

        let window_elapsed = (now - counter.window_started_at).num_seconds() as u64;
        if window_elapsed >= window_seconds {
            counter.window_started_at = now;
            counter.count = 0;
        }

        if counter.count >= max_requests {
            let retry_after = window_seconds.saturating_sub(window_elapsed);
            return Ok(RateLimitOutcome { allowed: false, retry_after_seconds: Some(retry_after) });
        }

        counter.count += 1;
        Ok(RateLimitOutcome { allowed: true, retry_after_seconds: None })
    }
}

pub struct AedituusLedgerSink {
    ledger: Arc<MemLedger>,
}

impl AedituusLedgerSink {
    pub fn new(ledger: Arc<MemLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl AedituusObsidianSink for AedituusLedgerSink {
    async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, AedituusError> {
        self.ledger.commit(request).await.map_err(|e| AedituusError::Upstream(e.to_string()))
    }
}

/// Concrete policy engine instantiation the gateway handlers depend on.
pub type MemAedituus = custodes_aedituus::Aedituus<MemPolicyStore, MemRateLimitStore, AedituusLedgerSink>;
