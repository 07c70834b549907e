// [libs/domain/atlas/tests/integration.rs]
//! Exercises Atlas against the real in-memory node/GPU/allocation/latency
//! stores and Obsidian sink from `custodes-infra-store`, covering the
//! discovery-scoring and release-idempotence testable properties.

use std::sync::Arc;

use custodes_atlas::config::RegistryConfig;
use custodes_atlas::Registry;
use custodes_domain_models::{
    DiscoveryCriteria, FinalAllocationStatus, GpuTier, NetworkTopologyRef, Pricing, PricingMode, RegisterGpuRequest,
    RegisterNodeRequest, RoutingStrategy, SupplyTier,
};
use custodes_infra_store::atlas::{AtlasLedgerSink, MemAllocationStore, MemGpuStore, MemLatencyStore, MemNodeStore};
use custodes_infra_store::obsidian::{MemDisputeStore, MemLedger, MemLedgerAppendStore, MemMerkleBlockStore, MemSequenceCounter};
use custodes_obsidian::config::LedgerConfig;
use uuid::Uuid;

fn new_registry() -> (Registry<MemNodeStore, MemGpuStore, MemAllocationStore, MemLatencyStore, AtlasLedgerSink>, Arc<MemGpuStore>) {
    let ledger = Arc::new(MemLedger::new(
        Arc::new(MemLedgerAppendStore::default()),
        Arc::new(MemSequenceCounter::default()),
        Arc::new(MemMerkleBlockStore::default()),
        Arc::new(MemDisputeStore::default()),
        LedgerConfig::default(),
    ));
    let nodes = Arc::new(MemNodeStore::default());
    let gpus = Arc::new(MemGpuStore::new(nodes.clone()));
    let allocations = Arc::new(MemAllocationStore::default());
    let latencies = Arc::new(MemLatencyStore::default());
    let sink = Arc::new(AtlasLedgerSink::new(ledger));
    (Registry::new(nodes, gpus.clone(), allocations, latencies, sink, RegistryConfig::default()), gpus)
}

fn node_request(supply_tier: SupplyTier) -> RegisterNodeRequest {
    RegisterNodeRequest {
        host_subject_id: Uuid::new_v4(),
        institution_id: None,
        campus_id: None,
        supply_tier,
        topology: NetworkTopologyRef { campus_id: None, fabric_group_id: None, has_tunnel_endpoint: false },
        region: "us-east".to_string(),
        heartbeat_interval_seconds: 30,
    }
}

fn gpu_request(node_id: Uuid, per_hour_usd: f64, vram_gb: f64) -> RegisterGpuRequest {
    RegisterGpuRequest {
        node_id,
        vendor_uuid: "GPU-0".to_string(),
        tier: GpuTier::Datacenter,
        model: "H100".to_string(),
        vram_gb,
        nvlink_capable: true,
        mig_capable: false,
        pricing: Pricing { per_hour_usd, mode: PricingMode::Fixed },
        power_cap_watts: 700,
        allowed_workload_types: vec!["training".to_string()],
        concurrent_job_limit: 4,
    }
}

#[tokio::test]
async fn balanced_strategy_favors_the_veritas_verified_backbone_gpu_over_the_cheap_edge_gpu() {
    let (registry, _gpus) = new_registry();

    let backbone = registry.register_node(node_request(SupplyTier::Backbone), "iphash".to_string()).await.unwrap();
    let edge = registry.register_node(node_request(SupplyTier::Edge), "iphash".to_string()).await.unwrap();

    let g1 = registry.register_gpu(gpu_request(backbone.node_id, 2.00, 80.0), "iphash".to_string()).await.unwrap();
    let g2 = registry.register_gpu(gpu_request(edge.node_id, 1.20, 24.0), "iphash".to_string()).await.unwrap();
    registry.mark_veritas_verified(backbone.node_id, "iphash".to_string()).await.unwrap();

    let criteria = DiscoveryCriteria {
        min_vram_gb: 16.0,
        gpu_tiers: None,
        require_nvlink: false,
        min_benchmark_score: None,
        min_node_trust: None,
        max_price_per_hour: None,
        workload_type: "training".to_string(),
        preferred_institution_id: None,
        preferred_campus_id: None,
        preferred_regions: None,
        preferred_tiers: None,
    };

    let balanced = registry.discover(&criteria, RoutingStrategy::Balanced).await.unwrap();
    assert_eq!(balanced.first().unwrap().gpu_id, g1.gpu_id, "a verified backbone GPU should outrank a cheaper unverified edge GPU under BALANCED");

    let cheapest = registry.discover(&criteria, RoutingStrategy::Cheapest).await.unwrap();
    assert_eq!(cheapest.first().unwrap().gpu_id, g2.gpu_id, "CHEAPEST must rank by price regardless of tier or verification");
}

#[tokio::test]
async fn releasing_the_same_allocation_twice_only_restores_vram_once() {
    let (registry, gpus) = new_registry();
    let node = registry.register_node(node_request(SupplyTier::Campus), "iphash".to_string()).await.unwrap();
    let gpu = registry.register_gpu(gpu_request(node.node_id, 2.0, 24.0), "iphash".to_string()).await.unwrap();

    let criteria = DiscoveryCriteria {
        min_vram_gb: 16.0,
        gpu_tiers: None,
        require_nvlink: false,
        min_benchmark_score: None,
        min_node_trust: None,
        max_price_per_hour: None,
        workload_type: "training".to_string(),
        preferred_institution_id: None,
        preferred_campus_id: None,
        preferred_regions: None,
        preferred_tiers: None,
    };

    let decision = registry.route(criteria, RoutingStrategy::Balanced, Uuid::new_v4(), Uuid::new_v4(), 1.0, "iphash".to_string()).await.unwrap();

    use custodes_atlas::store::GpuStore;
    let reserved = gpus.get(gpu.gpu_id).await.unwrap().unwrap();
    assert_eq!(reserved.vram_available_gb, 8.0);

    registry.release(decision.allocation.allocation_id, FinalAllocationStatus::Completed, 1.0, "iphash".to_string()).await.unwrap();
    let released = gpus.get(gpu.gpu_id).await.unwrap().unwrap();
    assert_eq!(released.vram_available_gb, 24.0);

    let second_release = registry.release(decision.allocation.allocation_id, FinalAllocationStatus::Completed, 1.0, "iphash".to_string()).await;
    assert!(second_release.is_err(), "a second release of a terminal allocation must be rejected");
    let unchanged = gpus.get(gpu.gpu_id).await.unwrap().unwrap();
    assert_eq!(unchanged.vram_available_gb, 24.0, "a rejected second release must never double-credit VRAM");
}
