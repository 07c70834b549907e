// [apps/watchdog/src/tasks.rs]
//! The three background sweeps the watchdog owns: heartbeat timeouts,
//! allocation expiry, and Merkle sealing.

use std::time::Duration;

use tokio::time::interval;
use tracing::{info, warn};

use crate::config::SweepIntervals;
use crate::state::WatchdogState;
use crate::util::system_ip_hash;

/// Marks nodes offline once their heartbeat goes stale, cancelling any
/// reserved allocation on them.
pub fn spawn_heartbeat_scan(state: &WatchdogState, config: &SweepIntervals) {
    let registry = state.registry.clone();
    let mut ticker = interval(Duration::from_secs(config.heartbeat_scan_interval_seconds));

    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            match registry.scan_heartbeat_timeouts(system_ip_hash()).await {
                Ok(offline) if !offline.is_empty() => {
                    warn!(count = offline.len(), "nodes marked offline by heartbeat scan");
                }
                Ok(_) => {}
                Err(err) => warn!(%err, "heartbeat scan failed"),
            }
        }
    });
}

/// Releases VRAM and marks allocations expired once they outlive their
/// hard duration ceiling.
pub fn spawn_allocation_expiry_scan(state: &WatchdogState, config: &SweepIntervals) {
    let registry = state.registry.clone();
    let mut ticker = interval(Duration::from_secs(config.allocation_expiry_scan_interval_seconds));

    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            match registry.scan_allocation_expiry(system_ip_hash()).await {
                Ok(expired) if !expired.is_empty() => {
                    warn!(count = expired.len(), "allocations expired by watchdog scan");
                }
                Ok(_) => {}
                Err(err) => warn!(%err, "allocation expiry scan failed"),
            }
        }
    });
}

/// Seals whatever entries have accumulated past the last Merkle block.
/// `recover_and_seal` is called once at startup, before this loop
/// starts, so a crash mid-block never leaves entries permanently
/// unsealed.
pub fn spawn_ledger_seal(state: &WatchdogState, config: &SweepIntervals) {
    let ledger = state.ledger.clone();
    let mut ticker = interval(Duration::from_secs(config.ledger_seal_interval_seconds));

    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            match ledger.seal_block().await {
                Ok(Some(block)) => info!(block_number = block.block_number, "ledger block sealed"),
                Ok(None) => {}
                Err(err) => warn!(%err, "ledger seal failed"),
            }
        }
    });
}
