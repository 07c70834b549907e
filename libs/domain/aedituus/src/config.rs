// [libs/domain/aedituus/src/config.rs]
//! Cache and rate-limit tuning for the policy pillar.

use custodes_domain_models::RateLimitConfig;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub instance_id: String,
    pub default_policy_id: Option<Uuid>,
    pub cache_ttl_seconds: i64,
    pub rate_limit_configs: Vec<RateLimitConfig>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            instance_id: "aedituus-default".to_string(),
            default_policy_id: None,
            cache_ttl_seconds: 300,
            rate_limit_configs: Vec::new(),
        }
    }
}
