// [libs/domain/atlas/src/config.rs]
//! Tunable knobs for the registry/router pillar's background scans and
//! default routing behavior.

use custodes_domain_models::RoutingStrategy;

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub heartbeat_timeout_seconds: u32,
    pub allocation_reservation_ttl_seconds: u32,
    pub default_routing_strategy: RoutingStrategy,
    pub max_discovery_results: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            heartbeat_timeout_seconds: 60,
            allocation_reservation_ttl_seconds: 300,
            default_routing_strategy: RoutingStrategy::Balanced,
            max_discovery_results: 20,
        }
    }
}
