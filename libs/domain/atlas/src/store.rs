// [libs/domain/atlas/src/store.rs]
/*!
 * APARATO: ATLAS STORE & SINK CONTRACTS
 * CLASIFICACIÓN: STORE ABSTRACTIONS (ESTRATO L2)
 * RESPONSABILIDAD: PUERTOS DE PERSISTENCIA Y EMISIÓN HACIA EL LEDGER
 */

use async_trait::async_trait;
use custodes_domain_models::{Allocation, CommitEventRequest, CommitResult, Gpu, Node};
use uuid::Uuid;

use crate::errors::AtlasError;

#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn get(&self, node_id: Uuid) -> Result<Option<Node>, AtlasError>;
    async fn upsert(&self, node: Node) -> Result<(), AtlasError>;
    /// Full scan used by the heartbeat watchdog and fabric/topology
    /// queries; store implementations may page internally.
    async fn list_all(&self) -> Result<Vec<Node>, AtlasError>;
}

#[async_trait]
pub trait GpuStore: Send + Sync {
    async fn get(&self, gpu_id: Uuid) -> Result<Option<Gpu>, AtlasError>;
    async fn upsert(&self, gpu: Gpu) -> Result<(), AtlasError>;
    async fn list_by_node(&self, node_id: Uuid) -> Result<Vec<Gpu>, AtlasError>;
    /// Every GPU on a discoverable node, used as the discovery candidate
    /// pool before hard filters and scoring are applied.
    async fn list_discoverable(&self) -> Result<Vec<(Gpu, Node)>, AtlasError>;
}

#[async_trait]
pub trait AllocationStore: Send + Sync {
    async fn get(&self, allocation_id: Uuid) -> Result<Option<Allocation>, AtlasError>;
    async fn upsert(&self, allocation: Allocation) -> Result<(), AtlasError>;
    async fn list_for_node(&self, node_id: Uuid) -> Result<Vec<Allocation>, AtlasError>;
    /// Every allocation still in a releasable status, used by the
    /// expiry watchdog.
    async fn list_releasable(&self) -> Result<Vec<Allocation>, AtlasError>;
}

/// Pairwise latency overlay; absent entries are treated as unknown
/// (the latency scoring band then contributes zero).
#[async_trait]
pub trait LatencyStore: Send + Sync {
    async fn latency_ms(&self, node_id: Uuid) -> Result<Option<f64>, AtlasError>;
}

#[async_trait]
pub trait AtlasObsidianSink: Send + Sync {
    async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, AtlasError>;
}
