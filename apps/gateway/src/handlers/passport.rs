// [apps/gateway/src/handlers/passport.rs]
//! Identity surface: issue, verify, revoke, ban, trust score, SSO
//! resolution.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::Json;
use custodes_dextera::TrustScoreResult;
use custodes_domain_models::{IssueRequest, ProviderClaims, Subject, VerifyResult};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::ApiError;
use crate::state::AppState;
use crate::util::hash_ip;

pub async fn issue(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<IssueRequest>,
) -> Result<Json<custodes_domain_models::Passport>, ApiError> {
    let passport = state.dextera.issue(request, hash_ip(&addr.ip().to_string())).await?;
    Ok(Json(passport))
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub token: String,
    pub audience: Option<String>,
}

pub async fn verify(State(state): State<AppState>, Json(request): Json<VerifyRequest>) -> Json<VerifyResult> {
    let result = state.dextera.verify(&request.token, request.audience.as_deref()).await;
    Json(result)
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub passport_id: Uuid,
    pub reason: String,
    pub by: Uuid,
}

pub async fn revoke(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<RevokeRequest>,
) -> Result<Json<()>, ApiError> {
    state
        .dextera
        .revoke(request.passport_id, request.reason, request.by, hash_ip(&addr.ip().to_string()))
        .await?;
    Ok(Json(()))
}

#[derive(Debug, Deserialize)]
pub struct BanRequest {
    pub subject_id: Uuid,
    pub reason: String,
    pub by: Uuid,
    #[serde(default)]
    pub notify_institution: bool,
}

pub async fn ban(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(request): Json<BanRequest>,
) -> Result<Json<()>, ApiError> {
    state
        .dextera
        .ban(request.subject_id, request.reason, request.by, request.notify_institution, hash_ip(&addr.ip().to_string()))
        .await?;
    Ok(Json(()))
}

pub async fn trust_score(State(state): State<AppState>, Path(subject_id): Path<Uuid>) -> Result<Json<TrustScoreResult>, ApiError> {
    let result = state.dextera.trust_score(subject_id).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
pub struct ResolveSsoRequest {
    pub claims: ProviderClaims,
    pub institution_id: Uuid,
}

pub async fn resolve_sso(State(state): State<AppState>, Json(request): Json<ResolveSsoRequest>) -> Result<Json<Subject>, ApiError> {
    let subject = state.dextera.resolve_sso(request.claims, request.institution_id).await?;
    Ok(Json(subject))
}
