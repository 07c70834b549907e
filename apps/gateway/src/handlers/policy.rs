// [apps/gateway/src/handlers/policy.rs]
//! Authorization surface: single and batched evaluation, cache
//! invalidation.

use axum::extract::State;
use axum::Json;
use custodes_domain_models::{ActionType, PolicyScope};
use serde::Deserialize;
use uuid::Uuid;

use custodes_aedituus::{AuthorizationRequest, AuthorizationResponse};

use crate::errors::ApiError;
use crate::state::AppState;

pub async fn authorize(State(state): State<AppState>, Json(request): Json<AuthorizationRequest>) -> Result<Json<AuthorizationResponse>, ApiError> {
    let response = state.aedituus.authorize(request).await?;
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeManyRequest {
    pub base: AuthorizationRequest,
    pub actions: Vec<ActionType>,
}

pub async fn authorize_many(
    State(state): State<AppState>,
    Json(request): Json<AuthorizeManyRequest>,
) -> Result<Json<Vec<AuthorizationResponse>>, ApiError> {
    let responses = state.aedituus.authorize_many(request.base, request.actions).await?;
    Ok(Json(responses))
}

#[derive(Debug, Deserialize)]
pub struct InvalidateCacheRequest {
    pub scope: Option<PolicyScope>,
    pub scope_id: Option<Uuid>,
}

pub async fn invalidate_cache(State(state): State<AppState>, Json(request): Json<InvalidateCacheRequest>) -> Json<()> {
    let key = request.scope.map(|scope| (scope, request.scope_id));
    state.aedituus.invalidate_cache(key);
    Json(())
}
