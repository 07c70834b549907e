// [libs/domain/dextera/src/lib.rs]
/*!
 * APARATO: DEXTERA
 * CLASIFICACIÓN: IDENTITY AND PASSPORT PILLAR (ESTRATO L2)
 * RESPONSABILIDAD: EMISIÓN DE IDENTIDAD VERIFICABLE Y PUNTAJE DE CONFIANZA
 *
 * Dextera owns subject identity, SSO claim resolution, the trust-score
 * formula, and the signed passport token lifecycle. It never imports
 * `custodes-obsidian` directly — every ledger write goes through the
 * `DexteraObsidianSink` trait declared in `store`, wired at the
 * infrastructure layer.
 */

pub mod config;
pub mod errors;
pub mod service;
pub mod store;
pub mod token;
pub mod trust;

pub use config::{PassportConfig, SigningAlgorithm};
pub use errors::DexteraError;
pub use service::Dextera;
pub use store::{BehavioralSignals, DexteraObsidianSink, InstitutionStore, RevocationStore, SubjectStore, TrustSignalStore};
pub use token::PassportClaims;
pub use trust::{compute_trust_score, trust_band, TrustBand, TrustBreakdown, TrustScoreResult, TrustSignals};
