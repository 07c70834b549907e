// [libs/domain/atlas/src/topology.rs]
/*!
 * APARATO: TOPOLOGY OVERLAY
 * CLASIFICACIÓN: PURE DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ALCANZABILIDAD ENTRE NODOS Y AGRUPACIÓN DE FABRIC
 */

use custodes_domain_models::{Node, SupplyTier};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TopologyLink {
    Direct,
    Wireguard,
    Backbone,
    None,
}

/// DIRECT when same campus, WIREGUARD if both expose a tunnel
/// endpoint, BACKBONE if both are backbone tier, else NONE.
pub fn can_communicate(a: &Node, b: &Node) -> TopologyLink {
    if a.campus_id.is_some() && a.campus_id == b.campus_id {
        return TopologyLink::Direct;
    }
    if a.topology.has_tunnel_endpoint && b.topology.has_tunnel_endpoint {
        return TopologyLink::Wireguard;
    }
    if a.supply_tier == SupplyTier::Backbone && b.supply_tier == SupplyTier::Backbone {
        return TopologyLink::Backbone;
    }
    TopologyLink::None
}

/// Every other node sharing `node`'s fabric group (NVLink/InfiniBand/
/// PCIe/Ethernet island), excluding `node` itself.
pub fn fabric_peers<'a>(node: &Node, all_nodes: &'a [Node]) -> Vec<&'a Node> {
    let Some(group_id) = node.topology.fabric_group_id else { return Vec::new() };
    all_nodes
        .iter()
        .filter(|other| other.node_id != node.node_id && other.topology.fabric_group_id == Some(group_id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use custodes_domain_models::NetworkTopologyRef;
    use uuid::Uuid;

    fn node(campus: Option<Uuid>, tunnel: bool, tier: SupplyTier, fabric: Option<Uuid>) -> Node {
        Node {
            node_id: Uuid::new_v4(),
            host_subject_id: Uuid::new_v4(),
            institution_id: None,
            campus_id: campus,
            supply_tier: tier,
            topology: NetworkTopologyRef { campus_id: campus, fabric_group_id: fabric, has_tunnel_endpoint: tunnel },
            region: "us-east".to_string(),
            status: custodes_domain_models::NodeStatus::Online,
            last_heartbeat_at: chrono::Utc::now(),
            heartbeat_interval_seconds: 30,
            veritas_verified: false,
            trust_score: 50,
            flags: vec![],
        }
    }

    #[test]
    fn same_campus_is_direct() {
        let campus = Uuid::new_v4();
        let a = node(Some(campus), false, SupplyTier::Edge, None);
        let b = node(Some(campus), false, SupplyTier::Edge, None);
        assert_eq!(can_communicate(&a, &b), TopologyLink::Direct);
    }

    #[test]
    fn tunnel_endpoints_fall_back_to_wireguard() {
        let a = node(None, true, SupplyTier::Edge, None);
        let b = node(None, true, SupplyTier::Edge, None);
        assert_eq!(can_communicate(&a, &b), TopologyLink::Wireguard);
    }

    #[test]
    fn edge_residential_without_tunnel_cannot_communicate() {
        let a = node(None, false, SupplyTier::Edge, None);
        let b = node(None, false, SupplyTier::Edge, None);
        assert_eq!(can_communicate(&a, &b), TopologyLink::None);
    }

    #[test]
    fn fabric_peers_excludes_self_and_other_groups() {
        let group = Uuid::new_v4();
        let a = node(None, false, SupplyTier::Backbone, Some(group));
        let b = node(None, false, SupplyTier::Backbone, Some(group));
        let c = node(None, false, SupplyTier::Backbone, None);
        let all = vec![a.clone(), b.clone(), c.clone()];
        let peers = fabric_peers(&a, &all);
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].node_id, b.node_id);
    }
}
