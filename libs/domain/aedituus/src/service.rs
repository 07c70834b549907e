// [libs/domain/aedituus/src/service.rs]
/*!
 * APARATO: AUTHORIZATION ENGINE
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: LÍMITE DE TASA, EVALUACIÓN DE POLÍTICA EN CAPAS
 */

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::Utc;
use custodes_domain_models::{ActionType, CommitEventRequest, Decision, DenyReason, EventType, Policy, PolicyScope, RateLimitScope, Severity};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::conditions::rule_matches;
use crate::config::PolicyConfig;
use crate::errors::AedituusError;
use crate::store::{AedituusObsidianSink, PolicyStore, RateLimitStore};
use crate::types::{AuthorizationRequest, AuthorizationResponse};

type CacheKey = (PolicyScope, Option<Uuid>);

struct CachedPolicy {
    policy: Policy,
    loaded_at: chrono::DateTime<Utc>,
}

pub struct Aedituus<P, R, Sink>
where
    P: PolicyStore,
    R: RateLimitStore,
    Sink: AedituusObsidianSink,
{
    policies: Arc<P>,
    rate_limits: Arc<R>,
    ledger: Arc<Sink>,
    config: PolicyConfig,
    cache: RwLock<HashMap<CacheKey, CachedPolicy>>,
}

impl<P, R, Sink> Aedituus<P, R, Sink>
where
    P: PolicyStore,
    R: RateLimitStore,
    Sink: AedituusObsidianSink,
{
    pub fn new(policies: Arc<P>, rate_limits: Arc<R>, ledger: Arc<Sink>, config: PolicyConfig) -> Self {
        Self { policies, rate_limits, ledger, config, cache: RwLock::new(HashMap::new()) }
    }

    /// Clears one cached layer, or the whole cache when `key` is `None`.
    pub fn invalidate_cache(&self, key: Option<CacheKey>) {
        let mut cache = self.cache.write().expect("policy cache poisoned");
        match key {
            Some(key) => {
                cache.remove(&key);
            }
            None => cache.clear(),
        }
    }

    async fn load_policy(&self, scope: PolicyScope, scope_id: Option<Uuid>) -> Result<Option<Policy>, AedituusError> {
        let key = (scope, scope_id);
        let now = Utc::now();

        if let Some(cached) = self.cache.read().expect("policy cache poisoned").get(&key) {
            if (now - cached.loaded_at).num_seconds() < self.config.cache_ttl_seconds {
                return Ok(Some(cached.policy.clone()));
            }
        }

        let fetched = self.policies.get_policy(scope, scope_id).await?;
        if let Some(policy) = &fetched {
            self.cache.write().expect("policy cache poisoned").insert(key, CachedPolicy { policy: policy.clone(), loaded_at: now });
        }
        Ok(fetched)
    }

    async fn check_rate_limits(&self, request: &AuthorizationRequest) -> Result<Option<(String, u64)>, AedituusError> {
        for rl in &self.config.rate_limit_configs {
            let (scope_label, scope_value) = match rl.scope {
                RateLimitScope::Subject => ("subject", Some(request.subject_id.to_string())),
                RateLimitScope::Institution => ("institution", request.institution_id.map(|id| id.to_string())),
                RateLimitScope::Ip => ("ip", Some(request.ip_hash.clone())),
            };
            let Some(scope_value) = scope_value else { continue };
            let key = format!("ratelimit:{scope_label}:{scope_value}:{:?}", request.action);
            let outcome = self.rate_limits.check_and_increment(&key, rl.window_seconds, rl.max_requests).await?;
            if !outcome.allowed {
                return Ok(Some((key, outcome.retry_after_seconds.unwrap_or(rl.window_seconds))));
            }
        }
        Ok(None)
    }

    /// Runs the rate-limit check, layered policy evaluation, and rule
    /// matching algorithm, then ledgers the decision regardless of
    /// outcome. Never returns an error for a deny — deny is a first
    /// class decision.
    #[instrument(skip(self, request), fields(subject_id = %request.subject_id, action = ?request.action))]
    pub async fn authorize(&self, request: AuthorizationRequest) -> Result<AuthorizationResponse, AedituusError> {
        let evaluation_id = Uuid::new_v4();
        let evaluated_at = Utc::now();

        if let Some((_key, retry_after)) = self.check_rate_limits(&request).await? {
            let response = AuthorizationResponse {
                decision: Decision::DenyCooldown,
                deny_reason: Some(DenyReason::RateLimitExceeded),
                constraints: None,
                step_up_method: None,
                retry_after_seconds: Some(retry_after),
                matched_rule_id: None,
                policy_id: None,
                policy_version: None,
                evaluation_id,
                evaluated_at,
                reason_message: "rate limit exceeded".to_string(),
            };
            self.emit_decision(&request, &response).await?;
            return Ok(response);
        }

        let layers: [(PolicyScope, Option<Uuid>); 4] = [
            (PolicyScope::Subject, Some(request.subject_id)),
            (PolicyScope::Institution, request.institution_id),
            (PolicyScope::Org, request.org_id),
            (PolicyScope::Platform, None),
        ];

        let mut fallback_decision: Option<(Policy, Decision)> = None;

        for (scope, scope_id) in layers {
            if scope != PolicyScope::Platform && scope_id.is_none() {
                continue;
            }
            let Some(policy) = self.load_policy(scope, scope_id).await? else { continue };

            for rule in policy.sorted_rules() {
                if !rule.is_live(evaluated_at) {
                    continue;
                }
                if !rule.action_types.contains(&request.action) {
                    continue;
                }
                if rule_matches(&rule.conditions, &request) {
                    let response = AuthorizationResponse {
                        decision: rule.decision,
                        deny_reason: rule.deny_reason,
                        constraints: rule.resource_constraints.clone(),
                        step_up_method: rule.step_up_method,
                        retry_after_seconds: None,
                        matched_rule_id: Some(rule.id),
                        policy_id: Some(policy.id),
                        policy_version: Some(policy.version),
                        evaluation_id,
                        evaluated_at,
                        reason_message: rule.description.clone(),
                    };
                    self.emit_decision(&request, &response).await?;
                    return Ok(response);
                }
            }

            if fallback_decision.is_none() {
                fallback_decision = Some((policy.clone(), policy.default_decision));
            }
        }

        let response = match fallback_decision {
            Some((policy, decision)) => AuthorizationResponse {
                decision,
                deny_reason: Some(DenyReason::NoMatchingRule),
                constraints: None,
                step_up_method: None,
                retry_after_seconds: None,
                matched_rule_id: None,
                policy_id: Some(policy.id),
                policy_version: Some(policy.version),
                evaluation_id,
                evaluated_at,
                reason_message: "no rule matched; applied policy default decision".to_string(),
            },
            None => AuthorizationResponse {
                decision: Decision::Deny,
                deny_reason: Some(DenyReason::PolicyNotFound),
                constraints: None,
                step_up_method: None,
                retry_after_seconds: None,
                matched_rule_id: None,
                policy_id: None,
                policy_version: None,
                evaluation_id,
                evaluated_at,
                reason_message: "no policy found at any layer".to_string(),
            },
        };
        self.emit_decision(&request, &response).await?;
        Ok(response)
    }

    /// Evaluates the same request bundle against every action in
    /// `actions`, reusing the policy cache across calls.
    pub async fn authorize_many(&self, base: AuthorizationRequest, actions: Vec<ActionType>) -> Result<Vec<AuthorizationResponse>, AedituusError> {
        let mut responses = Vec::with_capacity(actions.len());
        for action in actions {
            let mut request = base.clone();
            request.action = action;
            responses.push(self.authorize(request).await?);
        }
        Ok(responses)
    }

    async fn emit_decision(&self, request: &AuthorizationRequest, response: &AuthorizationResponse) -> Result<(), AedituusError> {
        let event_type = match response.decision {
            Decision::Allow | Decision::AllowLimited => EventType::PolicyAllow,
            _ => EventType::PolicyDeny,
        };
        let mut metadata = BTreeMap::new();
        metadata.insert("decision".to_string(), format!("{:?}", response.decision));
        metadata.insert("action".to_string(), format!("{:?}", request.action));
        if let Some(reason) = response.deny_reason {
            metadata.insert("deny_reason".to_string(), format!("{reason:?}"));
        }

        self.ledger
            .emit(CommitEventRequest {
                event_type,
                severity: Some(if event_type == EventType::PolicyDeny { Severity::Warn } else { Severity::Info }),
                subject_id: request.subject_id,
                passport_id: request.passport_id,
                institution_id: request.institution_id,
                target_id: Some(response.evaluation_id.to_string()),
                target_type: Some("authorization".to_string()),
                metadata,
                ip_hash: request.ip_hash.clone(),
                region: request.resource.region.clone(),
            })
            .await?;

        info!(decision = ?response.decision, evaluation_id = %response.evaluation_id, "authorization evaluated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RateLimitOutcome;
    use crate::templates::platform_baseline_policy;
    use crate::types::{ResourceAttributes, RiskContext};
    use custodes_domain_models::{ActionType, ClearanceLevel, CommitResult, Decision, SubjectType};
    use std::sync::atomic::{AtomicU64, Ordering};
    use tokio::sync::RwLock as AsyncRwLock;

    struct MemPolicies {
        platform: Policy,
    }
    #[async_trait::async_trait]
    impl PolicyStore for MemPolicies {
        async fn get_policy(&self, scope: PolicyScope, _scope_id: Option<Uuid>) -> Result<Option<Policy>, AedituusError> {
            Ok(if scope == PolicyScope::Platform { Some(self.platform.clone()) } else { None })
        }
    }

    #[derive(Default)]
    struct MemRateLimits {
        counts: AsyncRwLock<HashMap<String, u64>>,
    }
    #[async_trait::async_trait]
    impl RateLimitStore for MemRateLimits {
        async fn check_and_increment(&self, key: &str, _window_seconds: u64, max_requests: u64) -> Result<RateLimitOutcome, AedituusError> {
            let mut counts = self.counts.write().await;
            let entry = counts.entry(key.to_string()).or_insert(0);
            *entry += 1;
            Ok(RateLimitOutcome { allowed: *entry <= max_requests, retry_after_seconds: if *entry > max_requests { Some(60) } else { None } })
        }
    }

    #[derive(Default)]
    struct MemLedger {
        commits: AtomicU64,
    }
    #[async_trait::async_trait]
    impl AedituusObsidianSink for MemLedger {
        async fn emit(&self, _request: CommitEventRequest) -> Result<CommitResult, AedituusError> {
            let index = self.commits.fetch_add(1, Ordering::SeqCst);
            Ok(CommitResult { entry_id: Uuid::new_v4(), block_index: index, block_hash: "stub".to_string(), timestamp: Utc::now() })
        }
    }

    fn engine() -> Aedituus<MemPolicies, MemRateLimits, MemLedger> {
        Aedituus::new(
            Arc::new(MemPolicies { platform: platform_baseline_policy() }),
            Arc::new(MemRateLimits::default()),
            Arc::new(MemLedger::default()),
            PolicyConfig::default(),
        )
    }

    fn engine_with_subject_rate_limit(window_seconds: u64, max_requests: u64) -> Aedituus<MemPolicies, MemRateLimits, MemLedger> {
        Aedituus::new(
            Arc::new(MemPolicies { platform: platform_baseline_policy() }),
            Arc::new(MemRateLimits::default()),
            Arc::new(MemLedger::default()),
            PolicyConfig {
                rate_limit_configs: vec![custodes_domain_models::RateLimitConfig {
                    window_seconds,
                    max_requests,
                    scope: custodes_domain_models::RateLimitScope::Subject,
                }],
                ..PolicyConfig::default()
            },
        )
    }

    #[tokio::test]
    async fn hundred_and_first_request_in_window_is_denied_for_cooldown() {
        let engine = engine_with_subject_rate_limit(60, 100);
        let mut req = request(70, ActionType::JobSubmit);
        req.subject_id = Uuid::new_v4();

        for _ in 0..100 {
            let response = engine.authorize(req.clone()).await.unwrap();
            assert_ne!(response.decision, Decision::DenyCooldown);
        }

        let locked_out = engine.authorize(req.clone()).await.unwrap();
        assert_eq!(locked_out.decision, Decision::DenyCooldown);
        assert_eq!(locked_out.deny_reason, Some(DenyReason::RateLimitExceeded));
        let retry_after = locked_out.retry_after_seconds.unwrap();
        assert!(retry_after > 0 && retry_after <= 60);
    }

    fn request(trust_score: u8, action: ActionType) -> AuthorizationRequest {
        AuthorizationRequest {
            subject_id: Uuid::new_v4(),
            clearance_level: ClearanceLevel::Institutional,
            trust_score,
            subject_type: SubjectType::Researcher,
            institution_id: Some(Uuid::new_v4()),
            org_id: None,
            passport_id: None,
            action,
            resource: ResourceAttributes { vram_gb: Some(16.0), gpu_count: Some(1), gpu_tier: None, duration_hours: Some(4.0), workload_type: None, region: None, campus_id: None, estimated_cost: Some(2.0) },
            risk: RiskContext { current_risk_score: Some(10), concurrent_jobs: Some(1), monthly_spend: Some(10.0) },
            ip_hash: "iphash".to_string(),
            request_time: Utc::now(),
        }
    }

    #[tokio::test]
    async fn trusted_band_is_allow_limited_with_trusted_constraints() {
        let engine = engine();
        let response = engine.authorize(request(70, ActionType::JobSubmit)).await.unwrap();
        assert_eq!(response.decision, Decision::AllowLimited);
        assert_eq!(response.constraints.unwrap().max_vram_gb, Some(80.0));
    }

    #[tokio::test]
    async fn restricted_band_is_network_restricted_inference_only() {
        let engine = engine();
        let response = engine.authorize(request(10, ActionType::JobSubmit)).await.unwrap();
        assert_eq!(response.decision, Decision::AllowLimited);
        let constraints = response.constraints.unwrap();
        assert!(constraints.network_restricted);
        assert_eq!(constraints.workload_types_allowed, Some(vec!["inference".to_string()]));
    }

    #[tokio::test]
    async fn high_risk_triggers_step_up_ahead_of_trust_bands() {
        let engine = engine();
        let mut req = request(90, ActionType::JobSubmit);
        req.risk.current_risk_score = Some(85);
        let response = engine.authorize(req).await.unwrap();
        assert_eq!(response.decision, Decision::StepUp);
    }

    #[tokio::test]
    async fn payout_below_trust_floor_falls_through_to_default_deny() {
        let engine = engine();
        let response = engine.authorize(request(40, ActionType::PayoutRequest)).await.unwrap();
        assert_eq!(response.decision, Decision::Deny);
        assert_eq!(response.deny_reason, Some(DenyReason::NoMatchingRule));
    }

    #[tokio::test]
    async fn authorize_many_evaluates_every_action() {
        let engine = engine();
        let responses = engine.authorize_many(request(70, ActionType::JobSubmit), vec![ActionType::JobSubmit, ActionType::DataRead]).await.unwrap();
        assert_eq!(responses.len(), 2);
    }
}
