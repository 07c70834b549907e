// [libs/domain/models/src/lib.rs]
/*!
 * APARATO: CUSTODES DOMAIN MODELS
 * CLASIFICACIÓN: SHARED DATA LAYER (ESTRATO L2)
 * RESPONSABILIDAD: TIPOS DE DOMINIO Y TAXONOMÍA DE ERRORES COMPARTIDA
 *
 * Every pillar crate (Dextera, Aedituus, Obsidian, Atlas, Tutela) depends
 * on this crate for its entity shapes; none of them depend on each
 * other. Cross-pillar behavior is wired at the gateway/watchdog level
 * through the narrow sink traits each pillar declares for itself.
 */

pub mod action;
pub mod allocation;
pub mod detection;
pub mod dispute;
pub mod errors;
pub mod gpu;
pub mod institution;
pub mod ledger;
pub mod node;
pub mod passport;
pub mod policy;
pub mod subject;

pub use action::ActionType;
pub use allocation::{
    Allocation, AllocationStatus, DiscoveryCriteria, FinalAllocationStatus, RoutingDecision,
    RoutingStrategy, ScoredCandidate,
};
pub use detection::{
    Anomaly, AnomalySeverity, AnomalyType, ComputePatternTag, DetectionRule, EvaluateResult,
    Incident, IncidentStatus, ResponseAction, ResponseSpec, RiskBreakdown, RiskScore,
    RuntimeSignals, ThreatCategory, Thresholds,
};
pub use dispute::{Dispute, DisputeReason, DisputeStatus};
pub use gpu::{Gpu, GpuTier, Pricing, PricingMode, RegisterGpuRequest};
pub use institution::{Institution, SsoKind};
pub use ledger::{
    ChainVerificationReport, CommitEventRequest, CommitResult, EvidencePackage,
    EvidenceSubjectKind, EventType, LedgerEntry, LedgerQueryFilter, LedgerQueryResult,
    MerkleBlock, Severity,
};
pub use node::{NetworkTopologyRef, Node, NodeStatus, NodeTelemetry, RegisterNodeRequest, SupplyTier};
pub use passport::{IdentityProvider, IssueRequest, Passport, ProviderClaims, VerifyResult};
pub use policy::{
    BlackoutWindow, Decision, DenyReason, Policy, PolicyScope, RateLimitConfig, RateLimitScope,
    ResourceConstraints, Rule, RuleConditions, StepUpMethod, TimeWindow,
};
pub use subject::{ClearanceLevel, Subject, SubjectType};
