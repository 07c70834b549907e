// [libs/domain/models/src/node.rs]
//! Atlas's physical registry: the hosts GPUs are attached to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SupplyTier {
    Edge,
    Campus,
    Backbone,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeStatus {
    Online,
    Busy,
    Partial,
    Offline,
    Maintenance,
    Suspended,
    Benchmarking,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkTopologyRef {
    pub campus_id: Option<Uuid>,
    pub fabric_group_id: Option<Uuid>,
    pub has_tunnel_endpoint: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub node_id: Uuid,
    pub host_subject_id: Uuid,
    pub institution_id: Option<Uuid>,
    pub campus_id: Option<Uuid>,
    pub supply_tier: SupplyTier,
    pub topology: NetworkTopologyRef,
    pub region: String,
    pub status: NodeStatus,
    pub last_heartbeat_at: DateTime<Utc>,
    pub heartbeat_interval_seconds: u32,
    pub veritas_verified: bool,
    pub trust_score: u8,
    pub flags: Vec<String>,
}

impl Node {
    /// `now − last_heartbeat_at > 3 × heartbeat_interval` is the watchdog's
    /// staleness threshold.
    pub fn is_heartbeat_stale(&self, now: DateTime<Utc>) -> bool {
        let elapsed = (now - self.last_heartbeat_at).num_seconds();
        elapsed > 3 * self.heartbeat_interval_seconds as i64
    }

    pub fn is_discoverable(&self) -> bool {
        matches!(self.status, NodeStatus::Online | NodeStatus::Partial)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterNodeRequest {
    pub host_subject_id: Uuid,
    pub institution_id: Option<Uuid>,
    pub campus_id: Option<Uuid>,
    pub supply_tier: SupplyTier,
    pub topology: NetworkTopologyRef,
    pub region: String,
    pub heartbeat_interval_seconds: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeTelemetry {
    pub gpu_vram_free_gb: std::collections::BTreeMap<Uuid, f64>,
}
