// [apps/watchdog/src/main.rs]
//! Watchdog binary entry point: load environment, stand up tracing, seal
//! any block left open by a prior crash, then run the periodic sweeps
//! for the remainder of the process lifetime.

use custodes_shared_panopticon::init_tracing;
use custodes_watchdog::{tasks, WatchdogConfig, WatchdogState};
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    init_tracing("custodes_watchdog");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        let config = WatchdogConfig::from_env();
        let intervals = config.intervals();
        let state = WatchdogState::bootstrap(config);

        if let Some(block) = state.ledger.recover_and_seal().await? {
            info!(block_number = block.block_number, "recovered and sealed pending ledger entries");
        }

        tasks::spawn_heartbeat_scan(&state, &intervals);
        tasks::spawn_allocation_expiry_scan(&state, &intervals);
        tasks::spawn_ledger_seal(&state, &intervals);

        info!("custodes watchdog running");
        std::future::pending::<()>().await;
        Ok(())
    })
}
