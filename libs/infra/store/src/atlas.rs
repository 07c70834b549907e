// [libs/infra/store/src/atlas.rs]
/*!
 * APARATO: ATLAS IN-MEMORY STORES
 * CLASIFICACIÓN: INFRA ADAPTERS (ESTRATO L3)
 * RESPONSABILIDAD: IMPLEMENTACIÓN EN MEMORIA DE LOS PUERTOS DE NODOS,
 * GPUs, ASIGNACIONES Y LATENCIA
 */

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use custodes_atlas::errors::AtlasError;
use custodes_atlas::store::{AllocationStore, AtlasObsidianSink, GpuStore, LatencyStore, NodeStore};
use custodes_domain_models::{Allocation, AllocationStatus, CommitEventRequest, CommitResult, Gpu, Node};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::obsidian::MemLedger;

#[derive(Default)]
pub struct MemNodeStore {
    nodes: RwLock<HashMap<Uuid, Node>>,
}

#[async_trait]
impl NodeStore for MemNodeStore {
    async fn get(&self, node_id: Uuid) -> Result<Option<Node>, AtlasError> {
        Ok(self.nodes.read().await.get(&node_id).cloned())
    }

    async fn upsert(&self, node: Node) -> Result<(), AtlasError> {
        self.nodes.write().await.insert(node.node_id, node);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Node>, AtlasError> {
        Ok(self.nodes.read().await.values().cloned().collect())
    }
}

/// Holds a reference to the node store so `list_discoverable` can join
/// GPU and node rows without `GpuStore` and `NodeStore` depending on
/// each other.
pub struct MemGpuStore {
    gpus: RwLock<HashMap<Uuid, Gpu>>,
    nodes: Arc<MemNodeStore>,
}

impl MemGpuStore {
    pub fn new(nodes: Arc<MemNodeStore>) -> Self {
        Self { gpus: RwLock::new(HashMap::new()), nodes }
    }
}

#[async_trait]
impl GpuStore for MemGpuStore {
    async fn get(&self, gpu_id: Uuid) -> Result<Option<Gpu>, AtlasError> {
        Ok(self.gpus.read().await.get(&gpu_id).cloned())
    }

    async fn upsert(&self, gpu: Gpu) -> Result<(), AtlasError> {
        self.gpus.write().await.insert(gpu.gpu_id, gpu);
        Ok(())
    }

    async fn list_by_node(&self, node_id: Uuid) -> Result<Vec<Gpu>, AtlasError> {
        Ok(self.gpus.read().await.values().filter(|g| g.node_id == node_id).cloned().collect())
    }

    async fn list_discoverable(&self) -> Result<Vec<(Gpu, Node)>, AtlasError> {
        let gpus = self.gpus.read().await;
        let nodes = self.nodes.nodes.read().await;
        Ok(gpus.values().filter_map(|g| nodes.get(&g.node_id).map(|n| (g.clone(), n.clone()))).collect())
    }
}

#[derive(Default)]
pub struct MemAllocationStore {
    allocations: RwLock<HashMap<Uuid, Allocation>>,
}

#[async_trait]
impl AllocationStore for MemAllocationStore {
    async fn get(&self, allocation_id: Uuid) -> Result<Option<Allocation>, AtlasError> {
        Ok(self.allocations.read().await.get(&allocation_id).cloned())
    }

    async fn upsert(&self, allocation: Allocation) -> Result<(), AtlasError> {
        self.allocations.write().await.insert(allocation.allocation_id, allocation);
        Ok(())
    }

    async fn list_for_node(&self, node_id: Uuid) -> Result<Vec<Allocation>, AtlasError> {
        Ok(self.allocations.read().await.values().filter(|a| a.node_id == node_id).cloned().collect())
    }

    async fn list_releasable(&self) -> Result<Vec<Allocation>, AtlasError> {
        Ok(self
            .allocations
            .read()
            .await
            .values()
            .filter(|a| matches!(a.status, AllocationStatus::Reserved | AllocationStatus::Active))
            .cloned()
            .collect())
    }
}

impl MemAllocationStore {
    /// Only Tutela's kill-job sink needs this: given a job it is
    /// watching, find the allocation backing it. Not part of
    /// `AllocationStore` since no other caller needs a job-keyed lookup.
    pub async fn find_by_job(&self, job_id: Uuid) -> Option<Allocation> {
        self.allocations.read().await.values().find(|a| a.job_id == job_id).cloned()
    }
}

#[derive(Default)]
pub struct MemLatencyStore {
    latencies: RwLock<HashMap<Uuid, f64>>,
}

#[async_trait]
impl LatencyStore for MemLatencyStore {
    async fn latency_ms(&self, node_id: Uuid) -> Result<Option<f64>, AtlasError> {
        Ok(self.latencies.read().await.get(&node_id).copied())
    }
}

impl MemLatencyStore {
    pub async fn seed(&self, node_id: Uuid, latency_ms: f64) {
        self.latencies.write().await.insert(node_id, latency_ms);
    }
}

pub struct AtlasLedgerSink {
    ledger: Arc<MemLedger>,
}

impl AtlasLedgerSink {
    pub fn new(ledger: Arc<MemLedger>) -> Self {
        Self { ledger }
    }
}

#[async_trait]
impl AtlasObsidianSink for AtlasLedgerSink {
    async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, AtlasError> {
        self.ledger.commit(request).await.map_err(|e| AtlasError::Upstream(e.to_string()))
    }
}

/// Concrete registry instantiation Tutela's `TutelaAtlasSink` adapter
/// and the gateway handlers wrap.
pub type MemRegistry = custodes_atlas::Registry<MemNodeStore, MemGpuStore, MemAllocationStore, MemLatencyStore, AtlasLedgerSink>;
