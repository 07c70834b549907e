// [apps/gateway/src/handlers/registry.rs]
//! Physical registry and routing surface: node/GPU lifecycle, discovery,
//! routing, release, and fabric topology.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::Json;
use custodes_atlas::TopologyLink;
use custodes_domain_models::{
    DiscoveryCriteria, FinalAllocationStatus, Gpu, Node, NodeTelemetry, RegisterGpuRequest, RegisterNodeRequest,
    RoutingDecision, RoutingStrategy, ScoredCandidate,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;
use crate::util::hash_ip;

pub async fn register_node(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RegisterNodeRequest>,
) -> Result<Json<Node>, ApiError> {
    let node = state.registry.register_node(request, hash_ip(&addr.ip().to_string())).await?;
    Ok(Json(node))
}

pub async fn register_gpu(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RegisterGpuRequest>,
) -> Result<Json<Gpu>, ApiError> {
    let gpu = state.registry.register_gpu(request, hash_ip(&addr.ip().to_string())).await?;
    Ok(Json(gpu))
}

pub async fn heartbeat(
    State(state): State<AppState>,
    Path(node_id): Path<Uuid>,
    Json(telemetry): Json<Option<NodeTelemetry>>,
) -> Result<Json<()>, ApiError> {
    state.registry.heartbeat(node_id, telemetry).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct DiscoverRequest {
    pub criteria: DiscoveryCriteria,
    pub strategy: RoutingStrategy,
}

pub async fn discover(State(state): State<AppState>, Json(request): Json<DiscoverRequest>) -> Result<Json<Vec<ScoredCandidate>>, ApiError> {
    let candidates = state.registry.discover(&request.criteria, request.strategy).await?;
    Ok(Json(candidates))
}

#[derive(Debug, Deserialize)]
pub struct RouteRequest {
    pub criteria: DiscoveryCriteria,
    pub strategy: RoutingStrategy,
    pub job_id: Uuid,
    pub subject_id: Uuid,
    pub max_duration_hours: f64,
}

pub async fn route(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RouteRequest>,
) -> Result<Json<RoutingDecision>, ApiError> {
    let decision = state
        .registry
        .route(
            request.criteria,
            request.strategy,
            request.job_id,
            request.subject_id,
            request.max_duration_hours,
            hash_ip(&addr.ip().to_string()),
        )
        .await?;
    Ok(Json(decision))
}

#[derive(Debug, Deserialize)]
pub struct ReleaseRequest {
    pub final_status: FinalAllocationStatus,
    pub actual_cost_usd: f64,
}

pub async fn release(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(allocation_id): Path<Uuid>,
    Json(request): Json<ReleaseRequest>,
) -> Result<Json<custodes_domain_models::Allocation>, ApiError> {
    let allocation = state
        .registry
        .release(allocation_id, request.final_status, request.actual_cost_usd, hash_ip(&addr.ip().to_string()))
        .await?;
    Ok(Json(allocation))
}

pub async fn suspend_node(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(node_id): Path<Uuid>,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    let cancelled_allocations = state.registry.suspend_node(node_id, hash_ip(&addr.ip().to_string())).await?;
    Ok(Json(cancelled_allocations))
}

pub async fn mark_veritas_verified(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(node_id): Path<Uuid>,
) -> Result<Json<Node>, ApiError> {
    let node = state.registry.mark_veritas_verified(node_id, hash_ip(&addr.ip().to_string())).await?;
    Ok(Json(node))
}

pub async fn can_communicate(State(state): State<AppState>, Path((a, b)): Path<(Uuid, Uuid)>) -> Result<Json<TopologyLink>, ApiError> {
    let link = state.registry.can_communicate(a, b).await?;
    Ok(Json(link))
}

pub async fn fabric_peers(State(state): State<AppState>, Path(node_id): Path<Uuid>) -> Result<Json<Vec<Node>>, ApiError> {
    let peers = state.registry.fabric_peers(node_id).await?;
    Ok(Json(peers))
}
