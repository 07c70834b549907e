// [apps/gateway/src/handlers/detector.rs]
//! Runtime anomaly surface: signal ingestion, evaluation, emergency
//! halt, rule tuning, and false-positive correction.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::Json;
use custodes_domain_models::{DetectionRule, EvaluateResult, Incident, RuntimeSignals, Thresholds};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;
use crate::util::hash_ip;

pub async fn ingest(State(state): State<AppState>, Json(signals): Json<RuntimeSignals>) -> Result<Json<()>, ApiError> {
    state.detector.ingest(signals).await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub signals: RuntimeSignals,
    pub subject_id: Uuid,
}

pub async fn evaluate(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResult>, ApiError> {
    let result = state.detector.evaluate(request.signals, request.subject_id, hash_ip(&addr.ip().to_string())).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct EmergencyHaltRequest {
    pub triggered_by_subject_id: Uuid,
}

pub async fn emergency_halt(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(node_id): Path<Uuid>,
    Json(request): Json<EmergencyHaltRequest>,
) -> Result<Json<Vec<Uuid>>, ApiError> {
    let killed_jobs = state
        .detector
        .emergency_halt(node_id, request.triggered_by_subject_id, hash_ip(&addr.ip().to_string()))
        .await?;
    Ok(Json(killed_jobs))
}

pub async fn tune_rule(
    State(state): State<AppState>,
    Path(rule_id): Path<Uuid>,
    Json(thresholds): Json<Thresholds>,
) -> Result<Json<DetectionRule>, ApiError> {
    let rule = state.detector.tune_rule(rule_id, thresholds).await?;
    Ok(Json(rule))
}

pub async fn mark_false_positive(State(state): State<AppState>, Path(incident_id): Path<Uuid>) -> Result<Json<Incident>, ApiError> {
    let incident = state.detector.mark_false_positive(incident_id).await?;
    Ok(Json(incident))
}

pub async fn seed_default_rules(State(state): State<AppState>) -> Result<Json<Vec<Uuid>>, ApiError> {
    let rule_ids = state.detector.seed_default_rules().await?;
    Ok(Json(rule_ids))
}
