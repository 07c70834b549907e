// [apps/gateway/src/handlers/ledger.rs]
//! Ledger surface: query, chain verification, evidence packaging, and
//! dispute lifecycle. `commit` itself is not exposed here — every
//! pillar emits through its own sink, and a raw public commit endpoint
//! would let a caller write ledger entries no pillar actually produced.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, Query, State};
use axum::Json;
use custodes_domain_models::{
    ChainVerificationReport, Dispute, DisputeReason, EvidencePackage, EvidenceSubjectKind, LedgerQueryFilter,
    LedgerQueryResult,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;
use crate::util::hash_ip;

pub async fn query(State(state): State<AppState>, Json(filter): Json<LedgerQueryFilter>) -> Result<Json<LedgerQueryResult>, ApiError> {
    let result = state.ledger.query(&filter).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRangeQuery {
    pub from: u64,
    pub to: u64,
}

pub async fn verify_chain_range(
    State(state): State<AppState>,
    Query(range): Query<VerifyRangeQuery>,
) -> Result<Json<ChainVerificationReport>, ApiError> {
    let report = state.ledger.verify_chain_range(range.from, range.to).await?;
    Ok(Json(report))
}

#[derive(Debug, Deserialize)]
pub struct EvidenceRequest {
    pub kind: EvidenceSubjectKind,
    pub id: String,
}

pub async fn generate_evidence_package(
    State(state): State<AppState>,
    Json(request): Json<EvidenceRequest>,
) -> Result<Json<EvidencePackage>, ApiError> {
    let package = state.ledger.generate_evidence_package(request.kind, &request.id).await?;
    Ok(Json(package))
}

#[derive(Debug, Deserialize)]
pub struct OpenDisputeRequest {
    pub job_id: Uuid,
    pub raised_by_subject_id: Uuid,
    pub reason: DisputeReason,
}

pub async fn open_dispute(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<OpenDisputeRequest>,
) -> Result<Json<Dispute>, ApiError> {
    let dispute = state
        .ledger
        .open_dispute(request.job_id, request.raised_by_subject_id, request.reason, hash_ip(&addr.ip().to_string()))
        .await?;
    Ok(Json(dispute))
}

#[derive(Debug, Deserialize)]
pub struct ResolveDisputeRequest {
    pub resolved_by: Uuid,
    pub outcome: String,
    pub refund_usd: Option<f64>,
}

pub async fn resolve_dispute(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(dispute_id): Path<Uuid>,
    Json(request): Json<ResolveDisputeRequest>,
) -> Result<Json<Dispute>, ApiError> {
    let dispute = state
        .ledger
        .resolve_dispute(dispute_id, request.resolved_by, request.outcome, request.refund_usd, hash_ip(&addr.ip().to_string()))
        .await?;
    Ok(Json(dispute))
}
