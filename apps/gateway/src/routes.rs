// [apps/gateway/src/routes.rs]
//! Nests each pillar's handlers under its own path prefix behind a
//! permissive CORS layer.

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::handlers::{detector, ledger, passport, policy, registry};
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any).max_age(Duration::from_secs(3600));

    let passport_routes = Router::new()
        .route("/issue", post(passport::issue))
        .route("/verify", post(passport::verify))
        .route("/revoke", post(passport::revoke))
        .route("/ban", post(passport::ban))
        .route("/trust-score/:subject_id", get(passport::trust_score))
        .route("/sso", post(passport::resolve_sso));

    let policy_routes = Router::new()
        .route("/authorize", post(policy::authorize))
        .route("/authorize-many", post(policy::authorize_many))
        .route("/cache/invalidate", post(policy::invalidate_cache));

    let ledger_routes = Router::new()
        .route("/query", post(ledger::query))
        .route("/verify", get(ledger::verify_chain_range))
        .route("/evidence", post(ledger::generate_evidence_package))
        .route("/disputes", post(ledger::open_dispute))
        .route("/disputes/:dispute_id/resolve", post(ledger::resolve_dispute));

    let registry_routes = Router::new()
        .route("/nodes", post(registry::register_node))
        .route("/nodes/:node_id/heartbeat", post(registry::heartbeat))
        .route("/nodes/:node_id/suspend", post(registry::suspend_node))
        .route("/nodes/:node_id/veritas-verify", post(registry::mark_veritas_verified))
        .route("/nodes/:a/communicate/:b", get(registry::can_communicate))
        .route("/nodes/:node_id/fabric-peers", get(registry::fabric_peers))
        .route("/gpus", post(registry::register_gpu))
        .route("/discover", post(registry::discover))
        .route("/route", post(registry::route))
        .route("/allocations/:allocation_id/release", post(registry::release));

    let detector_routes = Router::new()
        .route("/ingest", post(detector::ingest))
        .route("/evaluate", post(detector::evaluate))
        .route("/nodes/:node_id/emergency-halt", post(detector::emergency_halt))
        .route("/rules/:rule_id/tune", post(detector::tune_rule))
        .route("/rules/seed-defaults", post(detector::seed_default_rules))
        .route("/incidents/:incident_id/false-positive", post(detector::mark_false_positive));

    Router::new()
        .route("/healthz", get(|| async { "ok" }))
        .nest("/passport", passport_routes)
        .nest("/policy", policy_routes)
        .nest("/ledger", ledger_routes)
        .nest("/registry", registry_routes)
        .nest("/detector", detector_routes)
        .layer(cors)
        .with_state(state)
}
