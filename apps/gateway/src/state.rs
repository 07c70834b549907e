// [apps/gateway/src/state.rs]
//! Wires every in-memory store/sink adapter into the five pillar
//! services and bundles them behind one `Clone`-able handle for axum.

use std::sync::Arc;

use custodes_aedituus::Aedituus;
use custodes_atlas::Registry;
use custodes_dextera::Dextera;
use custodes_obsidian::Ledger;
use custodes_tutela::Detector;

use custodes_infra_store::aedituus::{
    AedituusLedgerSink, MemAedituus, MemPolicyStore, MemRateLimitStore,
};
use custodes_infra_store::atlas::{
    AtlasLedgerSink, MemAllocationStore, MemGpuStore, MemLatencyStore, MemNodeStore, MemRegistry,
};
use custodes_infra_store::dextera::{
    DexteraLedgerSink, MemDextera, MemInstitutionStore, MemRevocationStore, MemSubjectStore,
    MemTrustSignalStore,
};
use custodes_infra_store::obsidian::{
    MemDisputeStore, MemLedger, MemLedgerAppendStore, MemMerkleBlockStore, MemSequenceCounter,
};
use custodes_infra_store::tutela::{
    MemDetector, MemIncidentStore, MemRuleStore, MemSignalStore, TutelaDexteraBanSink,
    TutelaLedgerSink, TutelaRegistrySink,
};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<MemLedger>,
    pub dextera: Arc<MemDextera>,
    pub aedituus: Arc<MemAedituus>,
    pub registry: Arc<MemRegistry>,
    pub detector: Arc<MemDetector>,
}

impl AppState {
    /// Builds every store, wires each pillar's ledger sink back to the
    /// shared `MemLedger`, then wires Tutela's Atlas/Dextera sinks last
    /// since they depend on those pillars already being constructed.
    pub fn bootstrap(config: crate::config::GatewayConfig) -> Self {
        let ledger = Arc::new(MemLedger::new(
            Arc::new(MemLedgerAppendStore::default()),
            Arc::new(MemSequenceCounter::default()),
            Arc::new(MemMerkleBlockStore::default()),
            Arc::new(MemDisputeStore::default()),
            config.ledger,
        ));

        let subjects = Arc::new(MemSubjectStore::default());
        let institutions = Arc::new(MemInstitutionStore::default());
        let revocations = Arc::new(MemRevocationStore::default());
        let trust_signals = Arc::new(MemTrustSignalStore::default());
        let dextera_sink = Arc::new(DexteraLedgerSink::new(ledger.clone()));
        let dextera = Arc::new(Dextera::new(
            subjects,
            institutions,
            revocations,
            trust_signals,
            dextera_sink,
            config.passport,
        ));

        let policies = Arc::new(MemPolicyStore::default());
        let rate_limits = Arc::new(MemRateLimitStore::default());
        let aedituus_sink = Arc::new(AedituusLedgerSink::new(ledger.clone()));
        let aedituus = Arc::new(Aedituus::new(policies, rate_limits, aedituus_sink, config.policy));

        let nodes = Arc::new(MemNodeStore::default());
        let gpus = Arc::new(MemGpuStore::new(nodes.clone()));
        let allocations = Arc::new(MemAllocationStore::default());
        let latencies = Arc::new(MemLatencyStore::default());
        let atlas_sink = Arc::new(AtlasLedgerSink::new(ledger.clone()));
        let registry = Arc::new(Registry::new(nodes, gpus, allocations.clone(), latencies, atlas_sink, config.registry));

        let signals = Arc::new(MemSignalStore::default());
        let rules = Arc::new(MemRuleStore::default());
        let incidents = Arc::new(MemIncidentStore::default());
        let tutela_sink = Arc::new(TutelaLedgerSink::new(ledger.clone()));
        let tutela_atlas = Arc::new(TutelaRegistrySink::new(registry.clone(), allocations));
        let tutela_dextera = Arc::new(TutelaDexteraBanSink::new(dextera.clone()));
        let detector = Arc::new(Detector::new(
            signals,
            rules,
            incidents,
            tutela_sink,
            tutela_atlas,
            tutela_dextera,
            config.detector,
        ));

        Self { ledger, dextera, aedituus, registry, detector }
    }
}
