// [apps/watchdog/src/config.rs]
//! Environment-driven configuration for the watchdog's sweep intervals
//! and the Atlas/Obsidian pillar configs it hosts.

use custodes_atlas::config::RegistryConfig;
use custodes_obsidian::config::LedgerConfig;

pub struct WatchdogConfig {
    pub ledger: LedgerConfig,
    pub registry: RegistryConfig,
    pub heartbeat_scan_interval_seconds: u64,
    pub allocation_expiry_scan_interval_seconds: u64,
    pub ledger_seal_interval_seconds: u64,
}

/// The sweep cadences, split out so they can outlive the pillar configs
/// once those are consumed by `WatchdogState::bootstrap`.
#[derive(Clone, Copy)]
pub struct SweepIntervals {
    pub heartbeat_scan_interval_seconds: u64,
    pub allocation_expiry_scan_interval_seconds: u64,
    pub ledger_seal_interval_seconds: u64,
}

impl WatchdogConfig {
    pub fn from_env() -> Self {
        let ledger = LedgerConfig {
            instance_id: std::env::var("OBSIDIAN_INSTANCE_ID").unwrap_or_else(|_| "obsidian-watchdog".to_string()),
            signing_key: std::env::var("OBSIDIAN_SIGNING_KEY")
                .map(|key| key.into_bytes())
                .unwrap_or_else(|_| LedgerConfig::default().signing_key),
            ..LedgerConfig::default()
        };

        let registry = RegistryConfig::default();

        let heartbeat_scan_interval_seconds =
            std::env::var("WATCHDOG_HEARTBEAT_SCAN_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(30);
        let allocation_expiry_scan_interval_seconds =
            std::env::var("WATCHDOG_ALLOCATION_SCAN_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(30);
        let ledger_seal_interval_seconds =
            std::env::var("WATCHDOG_LEDGER_SEAL_SECONDS").ok().and_then(|v| v.parse().ok()).unwrap_or(60);

        Self {
            ledger,
            registry,
            heartbeat_scan_interval_seconds,
            allocation_expiry_scan_interval_seconds,
            ledger_seal_interval_seconds,
        }
    }

    pub fn intervals(&self) -> SweepIntervals {
        SweepIntervals {
            heartbeat_scan_interval_seconds: self.heartbeat_scan_interval_seconds,
            allocation_expiry_scan_interval_seconds: self.allocation_expiry_scan_interval_seconds,
            ledger_seal_interval_seconds: self.ledger_seal_interval_seconds,
        }
    }
}
