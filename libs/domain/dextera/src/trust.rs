// [libs/domain/dextera/src/trust.rs]
/*!
 * APARATO: TRUST SCORE ENGINE
 * CLASIFICACIÓN: PURE DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: COMPOSICIÓN PONDERADA DE SEÑALES DE CONFIANZA
 *
 * Pure function over a signal bundle — no store access, no I/O. The
 * weights and hard caps are fixed, not configurable per deployment:
 * the formula itself is platform policy, not a tunable.
 */

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrustBand {
    Restricted,
    Standard,
    Trusted,
    HighClearance,
}

pub fn trust_band(score: u8) -> TrustBand {
    match score {
        0..=30 => TrustBand::Restricted,
        31..=60 => TrustBand::Standard,
        61..=80 => TrustBand::Trusted,
        _ => TrustBand::HighClearance,
    }
}

/// Inputs to the trust score formula. Binary signals map to 0/100;
/// continuous signals are already normalized to `[0, 1]`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustSignals {
    pub identity_verified: bool,
    pub mfa_verified: bool,
    pub device_bound: bool,
    pub institution_verified: bool,
    /// Account age in days; the formula caps the contribution at 365 days.
    pub account_age_days: f64,
    /// `[0, 1]` — proportion of logins from consistent devices/locations.
    pub login_consistency: f64,
    pub fraud_flagged: bool,
    pub abuse_flagged: bool,
    /// `[0, 1]` — completed jobs over attempted jobs.
    pub job_completion_rate: f64,
    /// `[0, 1]` — payment method health (no chargebacks, valid instrument).
    pub payment_health: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrustBreakdown {
    pub identity_verified: f64,
    pub mfa: f64,
    pub device_bound: f64,
    pub institution_verified: f64,
    pub account_age: f64,
    pub login_consistency: f64,
    pub no_fraud_flags: f64,
    pub no_abuse_flags: f64,
    pub job_completion_rate: f64,
    pub payment_health: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustScoreResult {
    pub score: u8,
    pub band: TrustBand,
    pub breakdown: TrustBreakdown,
}

fn binary(flag: bool) -> f64 {
    if flag {
        100.0
    } else {
        0.0
    }
}

fn unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0) * 100.0
}

/// Computes the weighted 0-100 trust score, applies the fraud and
/// no-institution hard caps, and classifies the result into a band.
pub fn compute_trust_score(signals: &TrustSignals) -> TrustScoreResult {
    let breakdown = TrustBreakdown {
        identity_verified: binary(signals.identity_verified),
        mfa: binary(signals.mfa_verified),
        device_bound: binary(signals.device_bound),
        institution_verified: binary(signals.institution_verified),
        account_age: unit(signals.account_age_days / 365.0),
        login_consistency: unit(signals.login_consistency),
        no_fraud_flags: binary(!signals.fraud_flagged),
        no_abuse_flags: binary(!signals.abuse_flagged),
        job_completion_rate: unit(signals.job_completion_rate),
        payment_health: unit(signals.payment_health),
    };

    let weighted = breakdown.identity_verified * 0.20
        + breakdown.mfa * 0.10
        + breakdown.device_bound * 0.10
        + breakdown.institution_verified * 0.20
        + breakdown.account_age * 0.10
        + breakdown.login_consistency * 0.10
        + breakdown.no_fraud_flags * 0.10
        + breakdown.no_abuse_flags * 0.05
        + breakdown.job_completion_rate * 0.03
        + breakdown.payment_health * 0.02;

    let mut score = weighted.round();

    if signals.fraud_flagged {
        score = score.min(30.0);
    }
    if !signals.institution_verified && !signals.fraud_flagged {
        score = score.min(80.0);
    }

    let score = score.clamp(0.0, 100.0) as u8;

    TrustScoreResult { score, band: trust_band(score), breakdown }
}
