// [libs/domain/tutela/src/config.rs]
/*!
 * APARATO: DETECTOR CONFIGURATION
 * CLASIFICACIÓN: CONFIGURATION (ESTRATO L2)
 * RESPONSABILIDAD: UMBRALES Y PARÁMETROS DE TIEMPO DEL DETECTOR
 */

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub instance_id: String,
    /// How often a node's signals are expected to arrive; the rolling
    /// window used for the composite risk score is built from samples
    /// within this many seconds of "now".
    pub signal_eval_interval_seconds: u64,
    pub risk_score_window_seconds: i64,
    pub power_grace_pct: f64,
    pub network_baseline_bytes_per_sec: f64,
    pub crypto_pool_domains: Vec<String>,
    pub tor_exit_ips: Vec<String>,
    /// When `false`, `emergency_halt` refuses every request regardless
    /// of caller clearance — an operator-flipped kill switch for the
    /// kill switch.
    pub enable_emergency_halt: bool,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            instance_id: "tutela-default".to_string(),
            signal_eval_interval_seconds: 10,
            risk_score_window_seconds: 300,
            power_grace_pct: 5.0,
            network_baseline_bytes_per_sec: 10.0 * 1024.0 * 1024.0,
            crypto_pool_domains: Vec::new(),
            tor_exit_ips: Vec::new(),
            enable_emergency_halt: true,
        }
    }
}
