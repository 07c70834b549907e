// [apps/gateway/src/errors.rs]
//! Maps every pillar's error type onto an HTTP status and a small JSON
//! body, so handlers can simply `?` a service call into a response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use custodes_aedituus::AedituusError;
use custodes_atlas::AtlasError;
use custodes_dextera::DexteraError;
use custodes_domain_models::errors::{AuthorizationFault, IdentityFault, ResourceFault, RuleFault};
use custodes_obsidian::ObsidianError;
use custodes_tutela::TutelaError;

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<DexteraError> for ApiError {
    fn from(err: DexteraError) -> Self {
        match &err {
            DexteraError::Identity(identity) => {
                let status = match identity {
                    IdentityFault::Unauthenticated | IdentityFault::TokenExpired | IdentityFault::TokenInvalid | IdentityFault::TokenRevoked(_) => {
                        StatusCode::UNAUTHORIZED
                    }
                    IdentityFault::Banned(_) => StatusCode::FORBIDDEN,
                    IdentityFault::NotFound(_) => StatusCode::NOT_FOUND,
                    IdentityFault::InvalidProvider => StatusCode::BAD_REQUEST,
                };
                ApiError::new(status, err.to_string())
            }
            DexteraError::Upstream(_) => ApiError::new(StatusCode::BAD_GATEWAY, err.to_string()),
            DexteraError::Signing(_) => ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        }
    }
}

impl From<AedituusError> for ApiError {
    fn from(err: AedituusError) -> Self {
        match &err {
            AedituusError::Authorization(fault) => {
                let status = match fault {
                    AuthorizationFault::Denied { .. } => StatusCode::FORBIDDEN,
                    AuthorizationFault::StepUpRequired { .. } => StatusCode::PRECONDITION_REQUIRED,
                    AuthorizationFault::ReviewRequired => StatusCode::ACCEPTED,
                    AuthorizationFault::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
                };
                ApiError::new(status, err.to_string())
            }
            AedituusError::Rule(fault) => {
                let status = match fault {
                    RuleFault::RuleNotFound(_) => StatusCode::NOT_FOUND,
                    RuleFault::RuleVersionInvalid(_) | RuleFault::ConfigMalformed(_) => StatusCode::BAD_REQUEST,
                };
                ApiError::new(status, err.to_string())
            }
            AedituusError::Upstream(_) => ApiError::new(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}

impl From<AtlasError> for ApiError {
    fn from(err: AtlasError) -> Self {
        match &err {
            AtlasError::Resource(fault) => {
                let status = match fault {
                    ResourceFault::NotFound(_) => StatusCode::NOT_FOUND,
                    ResourceFault::Conflict(_) => StatusCode::CONFLICT,
                    ResourceFault::Precondition(_) => StatusCode::PRECONDITION_FAILED,
                    ResourceFault::DiscoveryEmpty => StatusCode::NOT_FOUND,
                };
                ApiError::new(status, err.to_string())
            }
            AtlasError::Upstream(_) => ApiError::new(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}

impl From<ObsidianError> for ApiError {
    fn from(err: ObsidianError) -> Self {
        match &err {
            ObsidianError::Chain(_) => ApiError::new(StatusCode::CONFLICT, err.to_string()),
            ObsidianError::NotFound(_) => ApiError::new(StatusCode::NOT_FOUND, err.to_string()),
            ObsidianError::Upstream(_) => ApiError::new(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}

impl From<TutelaError> for ApiError {
    fn from(err: TutelaError) -> Self {
        match &err {
            TutelaError::Rule(fault) => {
                let status = match fault {
                    RuleFault::RuleNotFound(_) => StatusCode::NOT_FOUND,
                    RuleFault::RuleVersionInvalid(_) | RuleFault::ConfigMalformed(_) => StatusCode::BAD_REQUEST,
                };
                ApiError::new(status, err.to_string())
            }
            TutelaError::Resource(fault) => {
                let status = match fault {
                    ResourceFault::NotFound(_) => StatusCode::NOT_FOUND,
                    ResourceFault::Conflict(_) => StatusCode::CONFLICT,
                    ResourceFault::Precondition(_) => StatusCode::PRECONDITION_FAILED,
                    ResourceFault::DiscoveryEmpty => StatusCode::NOT_FOUND,
                };
                ApiError::new(status, err.to_string())
            }
            TutelaError::HaltDisabled => ApiError::new(StatusCode::FORBIDDEN, err.to_string()),
            TutelaError::Upstream(_) => ApiError::new(StatusCode::BAD_GATEWAY, err.to_string()),
        }
    }
}
