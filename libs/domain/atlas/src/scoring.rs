// [libs/domain/atlas/src/scoring.rs]
/*!
 * APARATO: DISCOVERY SCORING
 * CLASIFICACIÓN: PURE DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: FILTRADO DURO Y PUNTUACIÓN COMPUESTA DE CANDIDATOS
 */

use custodes_domain_models::{DiscoveryCriteria, Gpu, Node, NodeStatus};

/// Disqualifies `gpu`/`node` against every hard filter in one pass.
/// Returns `false` on the first miss.
pub fn passes_hard_filters(gpu: &Gpu, node: &Node, criteria: &DiscoveryCriteria) -> bool {
    if gpu.vram_available_gb < criteria.min_vram_gb {
        return false;
    }
    if let Some(tiers) = &criteria.gpu_tiers {
        if !tiers.iter().any(|t| t == gpu_tier_label(gpu.tier)) {
            return false;
        }
    }
    if criteria.require_nvlink && !gpu.nvlink_capable {
        return false;
    }
    if let Some(min_benchmark) = criteria.min_benchmark_score {
        if gpu.benchmark_score.map(|s| s < min_benchmark).unwrap_or(true) {
            return false;
        }
    }
    if let Some(min_trust) = criteria.min_node_trust {
        if node.trust_score < min_trust {
            return false;
        }
    }
    if let Some(max_price) = criteria.max_price_per_hour {
        if gpu.pricing.per_hour_usd > max_price {
            return false;
        }
    }
    if !gpu.allowed_workload_types.iter().any(|w| w == &criteria.workload_type) {
        return false;
    }
    if !node.is_discoverable() {
        return false;
    }
    true
}

fn gpu_tier_label(tier: custodes_domain_models::GpuTier) -> &'static str {
    match tier {
        custodes_domain_models::GpuTier::Consumer => "consumer",
        custodes_domain_models::GpuTier::Prosumer => "prosumer",
        custodes_domain_models::GpuTier::Datacenter => "datacenter",
        custodes_domain_models::GpuTier::Flagship => "flagship",
    }
}

/// Composite 0-100 score for a candidate that has already cleared the
/// hard filters. `latency_ms` is `None` when no topology measurement
/// exists for the node.
pub fn score_candidate(gpu: &Gpu, node: &Node, criteria: &DiscoveryCriteria, latency_ms: Option<f64>) -> u32 {
    let mut score: i64 = 0;

    score += supply_tier_fit(node, criteria);
    score += institution_or_campus_fit(node, criteria);
    score += (node.trust_score as i64 * 15) / 100;
    if node.veritas_verified {
        score += 10;
    }
    score += vram_headroom_band(gpu, criteria);
    score += price_band(gpu, criteria);
    score += latency_band(latency_ms);
    score += region_band(node, criteria);

    score.clamp(0, 100) as u32
}

fn supply_tier_fit(node: &Node, criteria: &DiscoveryCriteria) -> i64 {
    let Some(preferred) = &criteria.preferred_tiers else { return 5 };
    let label = supply_tier_label(node.supply_tier);
    match preferred.iter().position(|t| t == label) {
        Some(0) => 25,
        Some(1) => 15,
        _ => 5,
    }
}

fn supply_tier_label(tier: custodes_domain_models::SupplyTier) -> &'static str {
    match tier {
        custodes_domain_models::SupplyTier::Edge => "edge",
        custodes_domain_models::SupplyTier::Campus => "campus",
        custodes_domain_models::SupplyTier::Backbone => "backbone",
    }
}

fn institution_or_campus_fit(node: &Node, criteria: &DiscoveryCriteria) -> i64 {
    let institution_match = criteria.preferred_institution_id.is_some() && criteria.preferred_institution_id == node.institution_id;
    let campus_match = criteria.preferred_campus_id.is_some() && criteria.preferred_campus_id == node.campus_id;
    if institution_match || campus_match {
        20
    } else {
        0
    }
}

fn vram_headroom_band(gpu: &Gpu, criteria: &DiscoveryCriteria) -> i64 {
    let delta = gpu.vram_available_gb - criteria.min_vram_gb;
    if delta >= criteria.min_vram_gb {
        10
    } else if delta > 0.0 {
        5
    } else {
        0
    }
}

fn price_band(gpu: &Gpu, criteria: &DiscoveryCriteria) -> i64 {
    match criteria.max_price_per_hour {
        Some(max_price) if max_price > 0.0 => (((1.0 - gpu.pricing.per_hour_usd / max_price) * 10.0).floor() as i64).max(0),
        Some(_) => 0,
        None => 5,
    }
}

fn latency_band(latency_ms: Option<f64>) -> i64 {
    match latency_ms {
        Some(ms) if ms < 5.0 => 5,
        Some(ms) if ms < 20.0 => 3,
        Some(ms) if ms < 50.0 => 1,
        _ => 0,
    }
}

fn region_band(node: &Node, criteria: &DiscoveryCriteria) -> i64 {
    match &criteria.preferred_regions {
        Some(regions) if regions.iter().any(|r| r == &node.region) => 5,
        _ => 0,
    }
}

/// True when `node.status` permits new reservations — a hard filter
/// dependency kept here so scoring and filtering share one notion of
/// "discoverable".
pub fn is_online_or_partial(status: NodeStatus) -> bool {
    matches!(status, NodeStatus::Online | NodeStatus::Partial)
}
