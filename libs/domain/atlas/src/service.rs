// [libs/domain/atlas/src/service.rs]
/*!
 * APARATO: REGISTRY & ROUTER
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: REGISTRO DE NODOS/GPU, DESCUBRIMIENTO PUNTUADO Y
 * ENRUTAMIENTO ATÓMICO DE ASIGNACIONES
 */

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use custodes_domain_models::errors::ResourceFault;
use custodes_domain_models::{
    Allocation, AllocationStatus, CommitEventRequest, DiscoveryCriteria, EventType,
    FinalAllocationStatus, Gpu, Node, NodeStatus, NodeTelemetry, RegisterGpuRequest,
    RegisterNodeRequest, RoutingDecision, RoutingStrategy, ScoredCandidate, Severity, SupplyTier,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::RegistryConfig;
use crate::errors::AtlasError;
use crate::scoring::{passes_hard_filters, score_candidate};
use crate::store::{AllocationStore, AtlasObsidianSink, GpuStore, LatencyStore, NodeStore};
use crate::topology::{self, TopologyLink};

pub struct Registry<N, G, A, L, Sink>
where
    N: NodeStore,
    G: GpuStore,
    A: AllocationStore,
    L: LatencyStore,
    Sink: AtlasObsidianSink,
{
    nodes: Arc<N>,
    gpus: Arc<G>,
    allocations: Arc<A>,
    latencies: Arc<L>,
    ledger: Arc<Sink>,
    config: RegistryConfig,
}

impl<N, G, A, L, Sink> Registry<N, G, A, L, Sink>
where
    N: NodeStore,
    G: GpuStore,
    A: AllocationStore,
    L: LatencyStore,
    Sink: AtlasObsidianSink,
{
    pub fn new(nodes: Arc<N>, gpus: Arc<G>, allocations: Arc<A>, latencies: Arc<L>, ledger: Arc<Sink>, config: RegistryConfig) -> Self {
        Self { nodes, gpus, allocations, latencies, ledger, config }
    }

    #[instrument(skip(self, request))]
    pub async fn register_node(&self, request: RegisterNodeRequest, ip_hash: String) -> Result<Node, AtlasError> {
        let node = Node {
            node_id: Uuid::new_v4(),
            host_subject_id: request.host_subject_id,
            institution_id: request.institution_id,
            campus_id: request.campus_id,
            supply_tier: request.supply_tier,
            topology: request.topology,
            region: request.region,
            status: NodeStatus::Online,
            last_heartbeat_at: Utc::now(),
            heartbeat_interval_seconds: request.heartbeat_interval_seconds,
            veritas_verified: false,
            trust_score: 50,
            flags: Vec::new(),
        };
        self.nodes.upsert(node.clone()).await?;

        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::NodeRegistered,
                severity: Some(Severity::Info),
                subject_id: node.host_subject_id,
                passport_id: None,
                institution_id: node.institution_id,
                target_id: Some(node.node_id.to_string()),
                target_type: Some("node".to_string()),
                metadata: BTreeMap::new(),
                ip_hash,
                region: Some(node.region.clone()),
            })
            .await?;

        info!(node_id = %node.node_id, "node registered");
        Ok(node)
    }

    #[instrument(skip(self, request))]
    pub async fn register_gpu(&self, request: RegisterGpuRequest, ip_hash: String) -> Result<Gpu, AtlasError> {
        let node = self
            .nodes
            .get(request.node_id)
            .await?
            .ok_or_else(|| ResourceFault::NotFound(format!("node {}", request.node_id)))?;

        let gpu = Gpu {
            gpu_id: Uuid::new_v4(),
            node_id: request.node_id,
            vendor_uuid: request.vendor_uuid,
            tier: request.tier,
            model: request.model,
            vram_gb: request.vram_gb,
            vram_available_gb: request.vram_gb,
            nvlink_capable: request.nvlink_capable,
            mig_capable: request.mig_capable,
            pricing: request.pricing,
            power_cap_watts: request.power_cap_watts,
            allowed_workload_types: request.allowed_workload_types,
            concurrent_job_limit: request.concurrent_job_limit,
            current_jobs: Vec::new(),
            benchmark_score: None,
        };
        self.gpus.upsert(gpu.clone()).await?;

        let mut metadata = BTreeMap::new();
        metadata.insert("model".to_string(), gpu.model.clone());
        metadata.insert("vram_gb".to_string(), gpu.vram_gb.to_string());
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::GpuRegistered,
                severity: Some(Severity::Info),
                subject_id: node.host_subject_id,
                passport_id: None,
                institution_id: node.institution_id,
                target_id: Some(gpu.gpu_id.to_string()),
                target_type: Some("gpu".to_string()),
                metadata,
                ip_hash,
                region: Some(node.region),
            })
            .await?;

        info!(gpu_id = %gpu.gpu_id, node_id = %request.node_id, "gpu registered");
        Ok(gpu)
    }

    /// Updates `last_heartbeat_at`; if `telemetry` is attached, each
    /// reported GPU's `vram_available_gb` is overwritten from the
    /// free-VRAM reading.
    #[instrument(skip(self, telemetry))]
    pub async fn heartbeat(&self, node_id: Uuid, telemetry: Option<NodeTelemetry>) -> Result<(), AtlasError> {
        let mut node = self.nodes.get(node_id).await?.ok_or_else(|| ResourceFault::NotFound(format!("node {node_id}")))?;
        node.last_heartbeat_at = Utc::now();
        if node.status == NodeStatus::Offline {
            node.status = NodeStatus::Online;
        }
        self.nodes.upsert(node).await?;

        if let Some(telemetry) = telemetry {
            for (gpu_id, vram_free_gb) in telemetry.gpu_vram_free_gb {
                if let Some(mut gpu) = self.gpus.get(gpu_id).await? {
                    gpu.vram_available_gb = vram_free_gb.clamp(0.0, gpu.vram_gb);
                    self.gpus.upsert(gpu).await?;
                }
            }
        }
        Ok(())
    }

    /// Watchdog pass: any ONLINE/BUSY/PARTIAL node whose heartbeat is
    /// stale transitions to OFFLINE, and its RESERVED (not yet ACTIVE)
    /// allocations are CANCELLED with `released_at` set. Returns the
    /// node ids that were marked offline.
    #[instrument(skip(self))]
    pub async fn scan_heartbeat_timeouts(&self, ip_hash: String) -> Result<Vec<Uuid>, AtlasError> {
        let now = Utc::now();
        let mut newly_offline = Vec::new();

        for node in self.nodes.list_all().await? {
            if node.status == NodeStatus::Offline || node.status == NodeStatus::Maintenance {
                continue;
            }
            if !node.is_heartbeat_stale(now) {
                continue;
            }

            let node_id = node.node_id;
            let mut updated = node.clone();
            updated.status = NodeStatus::Offline;
            self.nodes.upsert(updated).await?;

            for allocation in self.allocations.list_for_node(node_id).await? {
                if allocation.status == AllocationStatus::Reserved {
                    let mut cancelled = allocation.clone();
                    cancelled.status = AllocationStatus::Cancelled;
                    cancelled.released_at = Some(now);
                    self.allocations.upsert(cancelled).await?;
                    if let Some(mut gpu) = self.gpus.get(allocation.gpu_id).await? {
                        gpu.release(allocation.job_id, allocation.vram_reserved_gb);
                        self.gpus.upsert(gpu).await?;
                    }
                }
            }

            self.ledger
                .emit(CommitEventRequest {
                    event_type: EventType::NodeOffline,
                    severity: Some(Severity::Warn),
                    subject_id: node.host_subject_id,
                    passport_id: None,
                    institution_id: node.institution_id,
                    target_id: Some(node_id.to_string()),
                    target_type: Some("node".to_string()),
                    metadata: BTreeMap::new(),
                    ip_hash: ip_hash.clone(),
                    region: Some(node.region.clone()),
                })
                .await?;

            warn!(node_id = %node_id, "node marked offline by heartbeat watchdog");
            newly_offline.push(node_id);
        }

        Ok(newly_offline)
    }

    /// Hard-filters and scores every discoverable candidate, tie-breaks
    /// by `(-score, price asc, trust desc)`, re-ranks for `strategy`,
    /// and truncates to `config.max_discovery_results`.
    #[instrument(skip(self, criteria))]
    pub async fn discover(&self, criteria: &DiscoveryCriteria, strategy: RoutingStrategy) -> Result<Vec<ScoredCandidate>, AtlasError> {
        let mut candidates = Vec::new();
        for (gpu, node) in self.gpus.list_discoverable().await? {
            if !passes_hard_filters(&gpu, &node, criteria) {
                continue;
            }
            let latency_ms = self.latencies.latency_ms(node.node_id).await?;
            let score = score_candidate(&gpu, &node, criteria, latency_ms);
            let estimated_wait_seconds = gpu.current_jobs.len() as u64 * 1800;
            candidates.push((
                ScoredCandidate {
                    gpu_id: gpu.gpu_id,
                    node_id: node.node_id,
                    score,
                    price_per_hour_usd: gpu.pricing.per_hour_usd,
                    node_trust_score: node.trust_score,
                    estimated_wait_seconds,
                },
                node.supply_tier,
            ));
        }

        candidates.sort_by(|(a, _), (b, _)| {
            b.score
                .cmp(&a.score)
                .then(a.price_per_hour_usd.partial_cmp(&b.price_per_hour_usd).unwrap_or(std::cmp::Ordering::Equal))
                .then(b.node_trust_score.cmp(&a.node_trust_score))
        });

        match strategy {
            RoutingStrategy::Cheapest => {
                candidates.sort_by(|(a, _), (b, _)| a.price_per_hour_usd.partial_cmp(&b.price_per_hour_usd).unwrap_or(std::cmp::Ordering::Equal))
            }
            RoutingStrategy::Fastest => candidates.sort_by(|(a, _), (b, _)| a.estimated_wait_seconds.cmp(&b.estimated_wait_seconds)),
            RoutingStrategy::HighestTrust => candidates.sort_by(|(a, _), (b, _)| b.node_trust_score.cmp(&a.node_trust_score)),
            RoutingStrategy::Institutional => candidates.sort_by(|(_, a), (_, b)| tier_preference(*b).cmp(&tier_preference(*a))),
            RoutingStrategy::Balanced => {}
        }

        candidates.truncate(self.config.max_discovery_results);
        Ok(candidates.into_iter().map(|(candidate, _)| candidate).collect())
    }

    /// Discovers, picks the top candidate, and atomically reserves it:
    /// creates the `Allocation`, decrements `vram_available_gb`,
    /// appends `job_id` to `gpu.current_jobs`, and emits
    /// `ALLOCATION_CREATED`.
    #[instrument(skip(self, criteria))]
    pub async fn route(
        &self,
        criteria: DiscoveryCriteria,
        strategy: RoutingStrategy,
        job_id: Uuid,
        subject_id: Uuid,
        max_duration_hours: f64,
        ip_hash: String,
    ) -> Result<RoutingDecision, AtlasError> {
        let candidates = self.discover(&criteria, strategy).await?;
        let winner = candidates.into_iter().next().ok_or(ResourceFault::DiscoveryEmpty)?;

        let mut gpu = self.gpus.get(winner.gpu_id).await?.ok_or_else(|| ResourceFault::NotFound(format!("gpu {}", winner.gpu_id)))?;
        let vram_reserved_gb = criteria.min_vram_gb;
        if !gpu.reserve(job_id, vram_reserved_gb) {
            return Err(ResourceFault::Conflict(format!("gpu {} lost capacity before reservation completed", gpu.gpu_id)).into());
        }
        self.gpus.upsert(gpu.clone()).await?;

        let now = Utc::now();
        let allocation = Allocation {
            allocation_id: Uuid::new_v4(),
            job_id,
            subject_id,
            gpu_id: winner.gpu_id,
            node_id: winner.node_id,
            vram_reserved_gb,
            power_cap_watts: gpu.power_cap_watts,
            max_duration_hours,
            workload_type: criteria.workload_type.clone(),
            price_per_hour_usd: winner.price_per_hour_usd,
            reserved_at: now,
            started_at: None,
            expires_at: now + Duration::seconds((max_duration_hours * 3600.0) as i64),
            released_at: None,
            status: AllocationStatus::Reserved,
        };
        self.allocations.upsert(allocation.clone()).await?;

        let mut metadata = BTreeMap::new();
        metadata.insert("gpu_id".to_string(), winner.gpu_id.to_string());
        metadata.insert("score".to_string(), winner.score.to_string());
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::AllocationCreated,
                severity: Some(Severity::Info),
                subject_id,
                passport_id: None,
                institution_id: None,
                target_id: Some(allocation.allocation_id.to_string()),
                target_type: Some("allocation".to_string()),
                metadata,
                ip_hash,
                region: None,
            })
            .await?;

        info!(allocation_id = %allocation.allocation_id, gpu_id = %winner.gpu_id, "allocation routed");
        Ok(RoutingDecision { allocation, candidate: winner })
    }

    /// Marks `allocation_id` with `final_status`, restores VRAM and
    /// `gpu.current_jobs`, and emits `ALLOCATION_RELEASED`.
    #[instrument(skip(self))]
    pub async fn release(&self, allocation_id: Uuid, final_status: FinalAllocationStatus, actual_cost_usd: f64, ip_hash: String) -> Result<Allocation, AtlasError> {
        let mut allocation = self
            .allocations
            .get(allocation_id)
            .await?
            .ok_or_else(|| ResourceFault::NotFound(format!("allocation {allocation_id}")))?;

        if allocation.status.is_terminal() {
            return Err(ResourceFault::Conflict(format!("allocation {allocation_id} already terminal")).into());
        }

        let now = Utc::now();
        allocation.status = final_status.into();
        allocation.released_at = Some(now);
        self.allocations.upsert(allocation.clone()).await?;
        self.restore_gpu_capacity(&allocation).await?;

        let mut metadata = BTreeMap::new();
        metadata.insert("duration_hours".to_string(), allocation.duration_hours().to_string());
        metadata.insert("actual_cost_usd".to_string(), actual_cost_usd.to_string());
        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::AllocationReleased,
                severity: Some(Severity::Info),
                subject_id: allocation.subject_id,
                passport_id: None,
                institution_id: None,
                target_id: Some(allocation_id.to_string()),
                target_type: Some("allocation".to_string()),
                metadata,
                ip_hash,
                region: None,
            })
            .await?;

        info!(allocation_id = %allocation_id, "allocation released");
        Ok(allocation)
    }

    /// Watchdog pass: any RESERVED/ACTIVE allocation whose `expires_at`
    /// has passed becomes EXPIRED, restoring resources exactly as
    /// `release` does. Returns the allocation ids that expired.
    #[instrument(skip(self))]
    pub async fn scan_allocation_expiry(&self, ip_hash: String) -> Result<Vec<Uuid>, AtlasError> {
        let now: DateTime<Utc> = Utc::now();
        let mut expired = Vec::new();

        for allocation in self.allocations.list_releasable().await? {
            if !allocation.is_hard_expired(now) {
                continue;
            }

            let allocation_id = allocation.allocation_id;
            let mut updated = allocation.clone();
            updated.status = AllocationStatus::Expired;
            updated.released_at = Some(now);
            self.allocations.upsert(updated).await?;
            self.restore_gpu_capacity(&allocation).await?;

            self.ledger
                .emit(CommitEventRequest {
                    event_type: EventType::AllocationExpired,
                    severity: Some(Severity::Warn),
                    subject_id: allocation.subject_id,
                    passport_id: None,
                    institution_id: None,
                    target_id: Some(allocation_id.to_string()),
                    target_type: Some("allocation".to_string()),
                    metadata: BTreeMap::new(),
                    ip_hash: ip_hash.clone(),
                    region: None,
                })
                .await?;

            warn!(allocation_id = %allocation_id, "allocation expired by watchdog");
            expired.push(allocation_id);
        }

        Ok(expired)
    }

    async fn restore_gpu_capacity(&self, allocation: &Allocation) -> Result<(), AtlasError> {
        if let Some(mut gpu) = self.gpus.get(allocation.gpu_id).await? {
            gpu.release(allocation.job_id, allocation.vram_reserved_gb);
            self.gpus.upsert(gpu).await?;
        }
        Ok(())
    }

    /// Kills every active allocation on `node_id` and suspends it.
    /// Used by Tutela's emergency-halt and KILL_AND_SUSPEND responses;
    /// the caller is responsible for the CLEARANCE_REVOKED /
    /// KILL_SWITCH_FIRED ledger entries that accompany the halt.
    #[instrument(skip(self))]
    pub async fn suspend_node(&self, node_id: Uuid, ip_hash: String) -> Result<Vec<Uuid>, AtlasError> {
        let mut node = self.nodes.get(node_id).await?.ok_or_else(|| ResourceFault::NotFound(format!("node {node_id}")))?;
        node.status = NodeStatus::Suspended;
        self.nodes.upsert(node.clone()).await?;

        let mut killed = Vec::new();
        for allocation in self.allocations.list_for_node(node_id).await? {
            if allocation.status.is_releasable() {
                let mut updated = allocation.clone();
                updated.status = AllocationStatus::Failed;
                updated.released_at = Some(Utc::now());
                self.allocations.upsert(updated).await?;
                self.restore_gpu_capacity(&allocation).await?;
                killed.push(allocation.allocation_id);
            }
        }

        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::NodeOffline,
                severity: Some(Severity::Security),
                subject_id: node.host_subject_id,
                passport_id: None,
                institution_id: node.institution_id,
                target_id: Some(node_id.to_string()),
                target_type: Some("node".to_string()),
                metadata: BTreeMap::new(),
                ip_hash,
                region: Some(node.region),
            })
            .await?;

        Ok(killed)
    }

    /// Flags a node as hardware-attested by the Veritas benchmark suite.
    /// Scoring (`scoring::score_candidate`) awards discovery points for
    /// this flag; it never affects hard-filter eligibility.
    #[instrument(skip(self))]
    pub async fn mark_veritas_verified(&self, node_id: Uuid, ip_hash: String) -> Result<Node, AtlasError> {
        let mut node = self.nodes.get(node_id).await?.ok_or_else(|| ResourceFault::NotFound(format!("node {node_id}")))?;
        node.veritas_verified = true;
        self.nodes.upsert(node.clone()).await?;

        self.ledger
            .emit(CommitEventRequest {
                event_type: EventType::NodeVeritasVerified,
                severity: Some(Severity::Info),
                subject_id: node.host_subject_id,
                passport_id: None,
                institution_id: node.institution_id,
                target_id: Some(node_id.to_string()),
                target_type: Some("node".to_string()),
                metadata: BTreeMap::new(),
                ip_hash,
                region: Some(node.region.clone()),
            })
            .await?;

        info!(node_id = %node_id, "node marked veritas-verified");
        Ok(node)
    }

    pub async fn can_communicate(&self, a: Uuid, b: Uuid) -> Result<TopologyLink, AtlasError> {
        let node_a = self.nodes.get(a).await?.ok_or_else(|| ResourceFault::NotFound(format!("node {a}")))?;
        let node_b = self.nodes.get(b).await?.ok_or_else(|| ResourceFault::NotFound(format!("node {b}")))?;
        Ok(topology::can_communicate(&node_a, &node_b))
    }

    pub async fn fabric_peers(&self, node_id: Uuid) -> Result<Vec<Node>, AtlasError> {
        let all_nodes = self.nodes.list_all().await?;
        let node = all_nodes
            .iter()
            .find(|n| n.node_id == node_id)
            .cloned()
            .ok_or_else(|| ResourceFault::NotFound(format!("node {node_id}")))?;
        Ok(topology::fabric_peers(&node, &all_nodes).into_iter().cloned().collect())
    }
}

/// Ordering key for the INSTITUTIONAL strategy: BACKBONE first, then
/// CAMPUS, then EDGE.
fn tier_preference(tier: SupplyTier) -> u8 {
    match tier {
        SupplyTier::Backbone => 2,
        SupplyTier::Campus => 1,
        SupplyTier::Edge => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodes_domain_models::{
        CommitResult, GpuTier, NetworkTopologyRef, Pricing, PricingMode, RegisterGpuRequest, RegisterNodeRequest,
    };
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    struct MemNodes(Mutex<HashMap<Uuid, Node>>);
    #[async_trait::async_trait]
    impl NodeStore for MemNodes {
        async fn get(&self, node_id: Uuid) -> Result<Option<Node>, AtlasError> {
            Ok(self.0.lock().await.get(&node_id).cloned())
        }
        async fn upsert(&self, node: Node) -> Result<(), AtlasError> {
            self.0.lock().await.insert(node.node_id, node);
            Ok(())
        }
        async fn list_all(&self) -> Result<Vec<Node>, AtlasError> {
            Ok(self.0.lock().await.values().cloned().collect())
        }
    }

    struct MemGpus(Mutex<HashMap<Uuid, Gpu>>);
    #[async_trait::async_trait]
    impl GpuStore for MemGpus {
        async fn get(&self, gpu_id: Uuid) -> Result<Option<Gpu>, AtlasError> {
            Ok(self.0.lock().await.get(&gpu_id).cloned())
        }
        async fn upsert(&self, gpu: Gpu) -> Result<(), AtlasError> {
            self.0.lock().await.insert(gpu.gpu_id, gpu);
            Ok(())
        }
        async fn list_by_node(&self, node_id: Uuid) -> Result<Vec<Gpu>, AtlasError> {
            Ok(self.0.lock().await.values().filter(|g| g.node_id == node_id).cloned().collect())
        }
        async fn list_discoverable(&self) -> Result<Vec<(Gpu, Node)>, AtlasError> {
            // Node pairing needs `MemNodes`, which this store doesn't hold;
            // tests route through `JoinedGpuStore` instead.
            Ok(Vec::new())
        }
    }

    struct Fixture {
        nodes: Arc<MemNodes>,
        gpus: Arc<MemGpus>,
        allocations: Arc<MemAllocations>,
        latencies: Arc<MemLatencies>,
        ledger: Arc<MemLedger>,
    }

    struct JoinedGpuStore {
        gpus: Arc<MemGpus>,
        nodes: Arc<MemNodes>,
    }
    #[async_trait::async_trait]
    impl GpuStore for JoinedGpuStore {
        async fn get(&self, gpu_id: Uuid) -> Result<Option<Gpu>, AtlasError> {
            self.gpus.get(gpu_id).await
        }
        async fn upsert(&self, gpu: Gpu) -> Result<(), AtlasError> {
            self.gpus.upsert(gpu).await
        }
        async fn list_by_node(&self, node_id: Uuid) -> Result<Vec<Gpu>, AtlasError> {
            self.gpus.list_by_node(node_id).await
        }
        async fn list_discoverable(&self) -> Result<Vec<(Gpu, Node)>, AtlasError> {
            let gpus = self.gpus.0.lock().await.values().cloned().collect::<Vec<_>>();
            let mut out = Vec::new();
            for gpu in gpus {
                if let Some(node) = self.nodes.get(gpu.node_id).await? {
                    out.push((gpu, node));
                }
            }
            Ok(out)
        }
    }

    struct MemAllocations(Mutex<HashMap<Uuid, Allocation>>);
    #[async_trait::async_trait]
    impl AllocationStore for MemAllocations {
        async fn get(&self, allocation_id: Uuid) -> Result<Option<Allocation>, AtlasError> {
            Ok(self.0.lock().await.get(&allocation_id).cloned())
        }
        async fn upsert(&self, allocation: Allocation) -> Result<(), AtlasError> {
            self.0.lock().await.insert(allocation.allocation_id, allocation);
            Ok(())
        }
        async fn list_for_node(&self, node_id: Uuid) -> Result<Vec<Allocation>, AtlasError> {
            Ok(self.0.lock().await.values().filter(|a| a.node_id == node_id).cloned().collect())
        }
        async fn list_releasable(&self) -> Result<Vec<Allocation>, AtlasError> {
            Ok(self.0.lock().await.values().filter(|a| a.status.is_releasable()).cloned().collect())
        }
    }

    struct MemLatencies;
    #[async_trait::async_trait]
    impl LatencyStore for MemLatencies {
        async fn latency_ms(&self, _node_id: Uuid) -> Result<Option<f64>, AtlasError> {
            Ok(Some(2.0))
        }
    }

    struct MemLedger(Mutex<Vec<CommitEventRequest>>);
    #[async_trait::async_trait]
    impl AtlasObsidianSink for MemLedger {
        async fn emit(&self, request: CommitEventRequest) -> Result<CommitResult, AtlasError> {
            self.0.lock().await.push(request);
            Ok(CommitResult { entry_id: Uuid::new_v4(), block_index: 0, block_hash: String::new(), timestamp: Utc::now() })
        }
    }

    fn fixture() -> (Registry<MemNodes, JoinedGpuStore, MemAllocations, MemLatencies, MemLedger>, Fixture) {
        let nodes = Arc::new(MemNodes(Mutex::new(HashMap::new())));
        let gpus = Arc::new(MemGpus(Mutex::new(HashMap::new())));
        let allocations = Arc::new(MemAllocations(Mutex::new(HashMap::new())));
        let latencies = Arc::new(MemLatencies);
        let ledger = Arc::new(MemLedger(Mutex::new(Vec::new())));

        let joined = Arc::new(JoinedGpuStore { gpus: gpus.clone(), nodes: nodes.clone() });
        let registry = Registry::new(nodes.clone(), joined, allocations.clone(), latencies.clone(), ledger.clone(), RegistryConfig::default());
        (registry, Fixture { nodes, gpus, allocations, latencies, ledger })
    }

    fn node_request() -> RegisterNodeRequest {
        RegisterNodeRequest {
            host_subject_id: Uuid::new_v4(),
            institution_id: None,
            campus_id: None,
            supply_tier: SupplyTier::Backbone,
            topology: NetworkTopologyRef { campus_id: None, fabric_group_id: None, has_tunnel_endpoint: false },
            region: "us-east".to_string(),
            heartbeat_interval_seconds: 30,
        }
    }

    fn gpu_request(node_id: Uuid) -> RegisterGpuRequest {
        RegisterGpuRequest {
            node_id,
            vendor_uuid: "GPU-0".to_string(),
            tier: GpuTier::Datacenter,
            model: "H100".to_string(),
            vram_gb: 80.0,
            nvlink_capable: true,
            mig_capable: false,
            pricing: Pricing { per_hour_usd: 2.0, mode: PricingMode::Fixed },
            power_cap_watts: 700,
            allowed_workload_types: vec!["training".to_string()],
            concurrent_job_limit: 4,
        }
    }

    fn criteria() -> DiscoveryCriteria {
        DiscoveryCriteria {
            min_vram_gb: 16.0,
            gpu_tiers: None,
            require_nvlink: false,
            min_benchmark_score: None,
            min_node_trust: None,
            max_price_per_hour: Some(4.0),
            workload_type: "training".to_string(),
            preferred_institution_id: None,
            preferred_campus_id: None,
            preferred_regions: None,
            preferred_tiers: None,
        }
    }

    #[tokio::test]
    async fn route_then_release_restores_vram_exactly() {
        let (registry, _fx) = fixture();
        let node = registry.register_node(node_request(), "iphash".to_string()).await.unwrap();
        registry.register_gpu(gpu_request(node.node_id), "iphash".to_string()).await.unwrap();

        let job_id = Uuid::new_v4();
        let decision = registry.route(criteria(), RoutingStrategy::Balanced, job_id, Uuid::new_v4(), 1.0, "iphash".to_string()).await.unwrap();
        assert_eq!(decision.allocation.status, AllocationStatus::Reserved);

        let gpu_after_reserve = registry.gpus.get(decision.candidate.gpu_id).await.unwrap().unwrap();
        assert_eq!(gpu_after_reserve.vram_available_gb, 64.0);

        registry.release(decision.allocation.allocation_id, FinalAllocationStatus::Completed, 2.0, "iphash".to_string()).await.unwrap();
        let gpu_after_release = registry.gpus.get(decision.candidate.gpu_id).await.unwrap().unwrap();
        assert_eq!(gpu_after_release.vram_available_gb, 80.0);
    }

    #[tokio::test]
    async fn releasing_an_already_terminal_allocation_is_rejected_and_vram_is_untouched() {
        let (registry, _fx) = fixture();
        let node = registry.register_node(node_request(), "iphash".to_string()).await.unwrap();
        registry.register_gpu(gpu_request(node.node_id), "iphash".to_string()).await.unwrap();

        let decision = registry.route(criteria(), RoutingStrategy::Balanced, Uuid::new_v4(), Uuid::new_v4(), 1.0, "iphash".to_string()).await.unwrap();
        registry.release(decision.allocation.allocation_id, FinalAllocationStatus::Completed, 2.0, "iphash".to_string()).await.unwrap();
        let gpu_once = registry.gpus.get(decision.candidate.gpu_id).await.unwrap().unwrap();

        let second = registry.release(decision.allocation.allocation_id, FinalAllocationStatus::Completed, 2.0, "iphash".to_string()).await;
        assert!(second.is_err());

        let gpu_twice = registry.gpus.get(decision.candidate.gpu_id).await.unwrap().unwrap();
        assert_eq!(gpu_once.vram_available_gb, gpu_twice.vram_available_gb);
    }

    #[tokio::test]
    async fn balanced_strategy_favors_backbone_verified_trust_over_cheapest_strategy() {
        let (registry, fx) = fixture();
        let backbone = registry
            .register_node(
                RegisterNodeRequest { supply_tier: SupplyTier::Backbone, ..node_request() },
                "iphash".to_string(),
            )
            .await
            .unwrap();
        let edge = registry
            .register_node(RegisterNodeRequest { supply_tier: SupplyTier::Edge, ..node_request() }, "iphash".to_string())
            .await
            .unwrap();

        let g1 = registry
            .register_gpu(
                RegisterGpuRequest {
                    vram_gb: 80.0,
                    pricing: Pricing { per_hour_usd: 2.00, mode: PricingMode::Fixed },
                    ..gpu_request(backbone.node_id)
                },
                "iphash".to_string(),
            )
            .await
            .unwrap();
        let g2 = registry
            .register_gpu(
                RegisterGpuRequest {
                    vram_gb: 24.0,
                    pricing: Pricing { per_hour_usd: 1.20, mode: PricingMode::Fixed },
                    ..gpu_request(edge.node_id)
                },
                "iphash".to_string(),
            )
            .await
            .unwrap();

        registry.mark_veritas_verified(backbone.node_id, "iphash".to_string()).await.unwrap();

        fx.nodes.upsert({
            let mut n = fx.nodes.get(backbone.node_id).await.unwrap().unwrap();
            n.trust_score = 90;
            n
        }).await.unwrap();
        fx.nodes.upsert({
            let mut n = fx.nodes.get(edge.node_id).await.unwrap().unwrap();
            n.trust_score = 40;
            n
        }).await.unwrap();

        let mut discover_criteria = criteria();
        discover_criteria.min_vram_gb = 16.0;
        discover_criteria.preferred_tiers =
            Some(vec![SupplyTier::Backbone, SupplyTier::Campus, SupplyTier::Edge]);

        let balanced = registry
            .route(discover_criteria.clone(), RoutingStrategy::Balanced, Uuid::new_v4(), Uuid::new_v4(), 1.0, "iphash".to_string())
            .await
            .unwrap();
        assert_eq!(balanced.candidate.gpu_id, g1.gpu_id);

        let cheapest = registry
            .route(discover_criteria, RoutingStrategy::Cheapest, Uuid::new_v4(), Uuid::new_v4(), 1.0, "iphash".to_string())
            .await
            .unwrap();
        assert_eq!(cheapest.candidate.gpu_id, g2.gpu_id);
    }

    #[tokio::test]
    async fn discover_with_no_candidates_yields_empty_route_error() {
        let (registry, _fx) = fixture();
        let err = registry.route(criteria(), RoutingStrategy::Balanced, Uuid::new_v4(), Uuid::new_v4(), 1.0, "iphash".to_string()).await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn stale_heartbeat_marks_node_offline_and_cancels_reservations() {
        let (registry, fx) = fixture();
        let node = registry.register_node(node_request(), "iphash".to_string()).await.unwrap();
        registry.register_gpu(gpu_request(node.node_id), "iphash".to_string()).await.unwrap();

        let job_id = Uuid::new_v4();
        let decision = registry.route(criteria(), RoutingStrategy::Balanced, job_id, Uuid::new_v4(), 1.0, "iphash".to_string()).await.unwrap();

        let mut stale_node = fx.nodes.get(node.node_id).await.unwrap().unwrap();
        stale_node.last_heartbeat_at = Utc::now() - Duration::seconds(1000);
        fx.nodes.upsert(stale_node).await.unwrap();

        let offline = registry.scan_heartbeat_timeouts("iphash".to_string()).await.unwrap();
        assert_eq!(offline, vec![node.node_id]);

        let allocation = fx.allocations.get(decision.allocation.allocation_id).await.unwrap().unwrap();
        assert_eq!(allocation.status, AllocationStatus::Cancelled);
        assert!(allocation.released_at.is_some());

        let _ = &fx.latencies;
        let _ = &fx.ledger;
        let _ = &fx.gpus;
    }
}
