// [libs/domain/aedituus/src/lib.rs]
/*!
 * APARATO: AEDITUUS
 * CLASIFICACIÓN: AUTHORIZATION PILLAR (ESTRATO L2)
 * RESPONSABILIDAD: LÍMITE DE TASA, POLÍTICA EN CAPAS Y DECISIONES DE ACCESO
 *
 * Aedituus owns rate limiting and layered policy evaluation. It never
 * imports `custodes-obsidian` directly — every ledger write goes
 * through the `AedituusObsidianSink` trait declared in `store`.
 */

pub mod conditions;
pub mod config;
pub mod errors;
pub mod service;
pub mod store;
pub mod templates;
pub mod types;

pub use config::PolicyConfig;
pub use errors::AedituusError;
pub use service::Aedituus;
pub use store::{AedituusObsidianSink, PolicyStore, RateLimitOutcome, RateLimitStore};
pub use templates::{platform_baseline_policy, university_template_policy};
pub use types::{AuthorizationRequest, AuthorizationResponse, ResourceAttributes, RiskContext};
