// [libs/infra/store/src/lib.rs]
//! In-memory store implementations and cross-pillar sink adapters.
//!
//! Every pillar crate declares its own store/sink traits and never
//! depends on another pillar's crate directly; this crate is the only
//! place that imports all five and wires them together. Swapping these
//! in-memory maps for a real database means implementing the same
//! traits against that database — nothing upstream changes.

pub mod aedituus;
pub mod atlas;
pub mod dextera;
pub mod obsidian;
pub mod tutela;
