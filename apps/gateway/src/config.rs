// [apps/gateway/src/config.rs]
//! Environment-driven configuration for the five pillar services the
//! gateway wires together.

use custodes_aedituus::config::PolicyConfig;
use custodes_atlas::config::RegistryConfig;
use custodes_dextera::config::{PassportConfig, SigningAlgorithm};
use custodes_obsidian::config::LedgerConfig;
use custodes_tutela::config::DetectorConfig;

pub struct GatewayConfig {
    pub port: u16,
    pub ledger: LedgerConfig,
    pub passport: PassportConfig,
    pub policy: PolicyConfig,
    pub registry: RegistryConfig,
    pub detector: DetectorConfig,
}

impl GatewayConfig {
    /// Reads every pillar's signing material and tuning knobs from the
    /// environment, falling back to each pillar's `Default` for anything
    /// unset. Production deployments are expected to set at least
    /// `OBSIDIAN_SIGNING_KEY` and `PASSPORT_SIGNING_KEY`.
    pub fn from_env() -> Self {
        let port: u16 = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string()).parse().unwrap_or(8080);

        let ledger = LedgerConfig {
            instance_id: std::env::var("OBSIDIAN_INSTANCE_ID").unwrap_or_else(|_| "obsidian-gateway".to_string()),
            signing_key: std::env::var("OBSIDIAN_SIGNING_KEY")
                .map(|key| key.into_bytes())
                .unwrap_or_else(|_| LedgerConfig::default().signing_key),
            ..LedgerConfig::default()
        };

        let passport = PassportConfig {
            signing_key_pem: std::env::var("PASSPORT_SIGNING_KEY")
                .map(|key| key.into_bytes())
                .unwrap_or_else(|_| PassportConfig::default().signing_key_pem),
            verifying_key_pem: std::env::var("PASSPORT_VERIFYING_KEY")
                .map(|key| key.into_bytes())
                .unwrap_or_else(|_| PassportConfig::default().verifying_key_pem),
            algorithm: match std::env::var("PASSPORT_ALGORITHM").as_deref() {
                Ok("RS256") => SigningAlgorithm::Rs256,
                _ => SigningAlgorithm::Hs256,
            },
            issuer: std::env::var("PASSPORT_ISSUER").unwrap_or_else(|_| PassportConfig::default().issuer),
            audience: std::env::var("PASSPORT_AUDIENCE").unwrap_or_else(|_| PassportConfig::default().audience),
            ..PassportConfig::default()
        };

        let policy = PolicyConfig {
            instance_id: std::env::var("AEDITUUS_INSTANCE_ID").unwrap_or_else(|_| "aedituus-gateway".to_string()),
            ..PolicyConfig::default()
        };

        let registry = RegistryConfig::default();
        let detector = DetectorConfig::default();

        Self { port, ledger, passport, policy, registry, detector }
    }
}
