// [libs/domain/tutela/src/lib.rs]
//! Tutela: the fifth pillar. Watches runtime telemetry for anomalous
//! GPU, network, and process behavior, scores composite risk per job,
//! and dispatches an automated response up to killing a job, suspending
//! a node, or banning a subject.
//!
//! Tutela never imports `custodes-obsidian`, `custodes-atlas`, or
//! `custodes-dextera` directly — only the narrow `TutelaObsidianSink`,
//! `TutelaAtlasSink`, and `TutelaDexteraSink` traits declared in
//! [`store`]. `libs/infra/store` wires those onto the live pillars.

pub mod config;
pub mod errors;
pub mod risk;
pub mod rules;
pub mod service;
pub mod store;

pub use config::DetectorConfig;
pub use errors::TutelaError;
pub use risk::compute_risk;
pub use rules::evaluate_anomalies;
pub use service::Detector;
pub use store::{IncidentStore, RuleStore, SignalStore, TutelaAtlasSink, TutelaDexteraSink, TutelaObsidianSink};
