// [libs/domain/atlas/src/lib.rs]
//! Atlas: node/GPU registry, discovery scoring, and allocation routing.

pub mod config;
pub mod errors;
pub mod scoring;
pub mod service;
pub mod store;
pub mod topology;

pub use config::RegistryConfig;
pub use errors::AtlasError;
pub use service::Registry;
pub use store::{AllocationStore, AtlasObsidianSink, GpuStore, LatencyStore, NodeStore};
pub use topology::TopologyLink;
