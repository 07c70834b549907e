// [apps/watchdog/src/state.rs]
//! Wires the watchdog's own ledger and registry instances. A production
//! deployment points these at the same database-backed stores the
//! gateway uses; this in-memory wiring is the single-process stand-in.

use std::sync::Arc;

use custodes_atlas::Registry;
use custodes_infra_store::atlas::{AtlasLedgerSink, MemAllocationStore, MemGpuStore, MemLatencyStore, MemNodeStore, MemRegistry};
use custodes_infra_store::obsidian::{MemDisputeStore, MemLedger, MemLedgerAppendStore, MemMerkleBlockStore, MemSequenceCounter};

use crate::config::WatchdogConfig;

pub struct WatchdogState {
    pub ledger: Arc<MemLedger>,
    pub registry: Arc<MemRegistry>,
}

impl WatchdogState {
    pub fn bootstrap(config: WatchdogConfig) -> Self {
        let ledger = Arc::new(MemLedger::new(
            Arc::new(MemLedgerAppendStore::default()),
            Arc::new(MemSequenceCounter::default()),
            Arc::new(MemMerkleBlockStore::default()),
            Arc::new(MemDisputeStore::default()),
            config.ledger,
        ));

        let nodes = Arc::new(MemNodeStore::default());
        let gpus = Arc::new(MemGpuStore::new(nodes.clone()));
        let allocations = Arc::new(MemAllocationStore::default());
        let latencies = Arc::new(MemLatencyStore::default());
        let atlas_sink = Arc::new(AtlasLedgerSink::new(ledger.clone()));
        let registry = Arc::new(Registry::new(nodes, gpus, allocations, latencies, atlas_sink, config.registry));

        Self { ledger, registry }
    }
}
