// [libs/domain/dextera/src/config.rs]
//! Signing material and lifetime knobs for the passport pillar.

#[derive(Debug, Clone)]
pub struct PassportConfig {
    /// PEM-encoded RS256 private key, or a raw HMAC secret when
    /// `algorithm` is `HS256`. Either way, the verifier is
    /// algorithm-locked: it never accepts `alg: none` or a token whose
    /// header algorithm disagrees with this configuration.
    pub signing_key_pem: Vec<u8>,
    pub verifying_key_pem: Vec<u8>,
    pub algorithm: SigningAlgorithm,
    pub issuer: String,
    pub audience: String,
    pub passport_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningAlgorithm {
    Rs256,
    Hs256,
}

impl Default for PassportConfig {
    fn default() -> Self {
        Self {
            signing_key_pem: b"change-me-in-production".to_vec(),
            verifying_key_pem: b"change-me-in-production".to_vec(),
            algorithm: SigningAlgorithm::Hs256,
            issuer: "custodes-dextera".to_string(),
            audience: "custodes-platform".to_string(),
            passport_ttl_seconds: 3600,
            refresh_ttl_seconds: 86_400,
        }
    }
}

impl PassportConfig {
    pub fn passport_ttl_bounds_seconds() -> (i64, i64) {
        (3600, 8 * 3600)
    }
}
