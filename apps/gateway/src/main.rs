// [apps/gateway/src/main.rs]
//! Gateway binary entry point: load environment, stand up tracing, and
//! serve the pillar API behind axum.

use std::net::SocketAddr;

use custodes_gateway::{routes, AppState, GatewayConfig};
use custodes_shared_panopticon::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("custodes_gateway");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        let config = GatewayConfig::from_env();
        let port = config.port;
        let state = AppState::bootstrap(config);
        let router = routes::build_router(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], port));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "custodes gateway listening");

        axum::serve(listener, router.into_make_service_with_connect_info::<SocketAddr>()).await?;
        Ok(())
    })
}
