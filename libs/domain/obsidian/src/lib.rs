// [libs/domain/obsidian/src/lib.rs]
/*!
 * APARATO: OBSIDIAN LEDGER PILLAR
 * CLASIFICACIÓN: DOMAIN PILLAR (ESTRATO L2)
 * RESPONSABILIDAD: ENCADENAMIENTO, SELLADO Y DISPUTA DEL LEDGER INMUTABLE
 *
 * Obsidian is a leaf pillar: every other pillar writes to it through a
 * narrow sink trait it declares for itself (`DexteraObsidianSink`,
 * `AedituusObsidianSink`, `AtlasObsidianSink`, `TutelaObsidianSink`), but
 * Obsidian never imports any of them back. This crate only knows about
 * `custodes-core-hashchain` and `custodes-domain-models`.
 */

pub mod config;
pub mod errors;
pub mod service;
pub mod signing;
pub mod store;

pub use config::LedgerConfig;
pub use errors::ObsidianError;
pub use service::Ledger;
pub use signing::LedgerSigner;
pub use store::{DisputeStore, LedgerAppendStore, MerkleBlockStore, SequenceCounter};
