// [libs/domain/dextera/src/token.rs]
/*!
 * APARATO: PASSPORT TOKEN CODEC
 * CLASIFICACIÓN: SIGNING ADAPTER (ESTRATO L2)
 * RESPONSABILIDAD: EMISIÓN Y VERIFICACIÓN DE TOKENS COMPACTOS FIRMADOS
 *
 * `jsonwebtoken` renders the compact signed token (payload + signature,
 * algorithm carried alongside rather than bolted on informally) — see
 * DESIGN.md for why a standard three-segment JWT was chosen over a
 * hand-rolled two-segment format. `Validation::algorithms` pins the
 * verifier to exactly one configured algorithm, so neither `alg: none`
 * nor a cross-algorithm
 * confusion attack can pass `decode_passport`.
 */

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use custodes_domain_models::errors::IdentityFault;
use custodes_domain_models::{ClearanceLevel, IdentityProvider, Passport, SubjectType};

use crate::config::{PassportConfig, SigningAlgorithm};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportClaims {
    pub iss: String,
    pub aud: String,
    pub sub: Uuid,
    pub iat: i64,
    pub exp: i64,
    pub jti: Uuid,
    pub clr: ClearanceLevel,
    pub trs: u8,
    pub sty: SubjectType,
    pub idp: IdentityProvider,
    pub mfa: bool,
    pub dev: bool,
    pub device_id: Option<String>,
    pub institution_id: Option<Uuid>,
}

fn jwt_algorithm(algorithm: SigningAlgorithm) -> Algorithm {
    match algorithm {
        SigningAlgorithm::Rs256 => Algorithm::RS256,
        SigningAlgorithm::Hs256 => Algorithm::HS256,
    }
}

fn encoding_key(config: &PassportConfig) -> Result<EncodingKey, IdentityFault> {
    match config.algorithm {
        SigningAlgorithm::Rs256 => {
            EncodingKey::from_rsa_pem(&config.signing_key_pem).map_err(|_| IdentityFault::TokenInvalid)
        }
        SigningAlgorithm::Hs256 => Ok(EncodingKey::from_secret(&config.signing_key_pem)),
    }
}

fn decoding_key(config: &PassportConfig) -> Result<DecodingKey, IdentityFault> {
    match config.algorithm {
        SigningAlgorithm::Rs256 => {
            DecodingKey::from_rsa_pem(&config.verifying_key_pem).map_err(|_| IdentityFault::TokenInvalid)
        }
        SigningAlgorithm::Hs256 => Ok(DecodingKey::from_secret(&config.verifying_key_pem)),
    }
}

/// Encodes `passport` as a compact signed token per the configured
/// issuer/audience/algorithm.
pub fn encode_passport(passport: &Passport, config: &PassportConfig) -> Result<String, IdentityFault> {
    let claims = PassportClaims {
        iss: config.issuer.clone(),
        aud: config.audience.clone(),
        sub: passport.subject_id,
        iat: passport.issued_at.timestamp(),
        exp: passport.expires_at.timestamp(),
        jti: passport.passport_id,
        clr: passport.clearance_level,
        trs: passport.trust_score,
        sty: passport.subject_type,
        idp: passport.identity_provider,
        mfa: passport.mfa_verified,
        dev: passport.device_bound,
        device_id: passport.device_id.clone(),
        institution_id: passport.institution_id,
    };

    let header = Header::new(jwt_algorithm(config.algorithm));
    let key = encoding_key(config)?;
    encode(&header, &claims, &key).map_err(|_| IdentityFault::TokenInvalid)
}

/// Validates signature, issuer, audience, and expiry. Rejects an
/// `aud` mismatch against `expected_audience` when provided.
pub fn decode_passport(token: &str, config: &PassportConfig, expected_audience: Option<&str>) -> Result<PassportClaims, IdentityFault> {
    let key = decoding_key(config)?;
    let mut validation = Validation::new(jwt_algorithm(config.algorithm));
    validation.set_issuer(&[config.issuer.clone()]);
    validation.set_audience(&[expected_audience.unwrap_or(&config.audience)]);

    let data = decode::<PassportClaims>(token, &key, &validation).map_err(|err| match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => IdentityFault::TokenExpired,
        _ => IdentityFault::TokenInvalid,
    })?;

    Ok(data.claims)
}

pub fn now_timestamp() -> i64 {
    Utc::now().timestamp()
}

pub fn from_timestamp(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn sample_passport() -> Passport {
        let now = Utc::now();
        Passport {
            passport_id: Uuid::new_v4(),
            subject_id: Uuid::new_v4(),
            subject_type: SubjectType::Researcher,
            clearance_level: ClearanceLevel::Institutional,
            institution_id: Some(Uuid::new_v4()),
            trust_score: 72,
            identity_provider: IdentityProvider::OidcEdu,
            mfa_verified: true,
            device_bound: false,
            device_id: None,
            issued_at: now,
            expires_at: now + Duration::hours(1),
            signature: String::new(),
        }
    }

    fn hmac_config() -> PassportConfig {
        PassportConfig {
            signing_key_pem: b"test-secret-key-material".to_vec(),
            verifying_key_pem: b"test-secret-key-material".to_vec(),
            algorithm: SigningAlgorithm::Hs256,
            ..PassportConfig::default()
        }
    }

    #[test]
    fn encode_then_decode_round_trips_claims() {
        let config = hmac_config();
        let passport = sample_passport();
        let token = encode_passport(&passport, &config).unwrap();
        let claims = decode_passport(&token, &config, None).unwrap();
        assert_eq!(claims.sub, passport.subject_id);
        assert_eq!(claims.trs, passport.trust_score);
    }

    #[test]
    fn wrong_audience_is_rejected() {
        let config = hmac_config();
        let passport = sample_passport();
        let token = encode_passport(&passport, &config).unwrap();
        let result = decode_passport(&token, &config, Some("some-other-audience"));
        assert!(result.is_err());
    }

    #[test]
    fn expired_token_reports_expired_not_generic_invalid() {
        let config = hmac_config();
        let mut passport = sample_passport();
        passport.issued_at = Utc::now() - Duration::hours(5);
        passport.expires_at = Utc::now() - Duration::hours(1);
        let token = encode_passport(&passport, &config).unwrap();
        let result = decode_passport(&token, &config, None);
        assert_eq!(result.unwrap_err(), IdentityFault::TokenExpired);
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let config = hmac_config();
        let passport = sample_passport();
        let mut token = encode_passport(&passport, &config).unwrap();
        token.push('x');
        assert!(decode_passport(&token, &config, None).is_err());
    }
}
