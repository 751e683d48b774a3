//! End-to-end pipeline tests: measure, gate, trip, appeal, reverse.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use ags_ari::TrackRequest;
use ags_audit::MemoryAuditSink;
use ags_breaker::EdmProbe;
use ags_gates::ResponsePlan;
use ags_service::{
    BhirSource, GovernanceConfig, GovernanceService, InteractionOutcome, ModelOrchestrator,
    PlannedResponse,
};
use ags_store::MemoryGovernanceStore;
use ags_tribunal::ConsensusOutcome;
use ags_types::{
    AgsResult, DimensionScores, GateName, Priority, SessionId, StakeholderRole, UserId, Vote,
    VoteDecision,
};

struct StaticOrchestrator {
    plan_text: String,
    cancel_capability: bool,
    estimated_latency_ms: u64,
    human_baseline_ms: u64,
}

impl Default for StaticOrchestrator {
    fn default() -> Self {
        Self {
            plan_text: "a short helpful answer".into(),
            cancel_capability: true,
            estimated_latency_ms: 1_000,
            human_baseline_ms: 2_000,
        }
    }
}

#[async_trait]
impl ModelOrchestrator for StaticOrchestrator {
    async fn plan_response(&self, _user: &UserId, _prompt: &str) -> AgsResult<PlannedResponse> {
        Ok(PlannedResponse {
            plan: ResponsePlan::new(self.plan_text.clone(), self.cancel_capability),
            estimated_latency_ms: self.estimated_latency_ms,
            human_baseline_ms: self.human_baseline_ms,
        })
    }
}

struct StaticEdm(u64);

#[async_trait]
impl EdmProbe for StaticEdm {
    async fn unresolved_high_severity_debt_count(&self, _user: &UserId) -> AgsResult<u64> {
        Ok(self.0)
    }
}

struct StaticBhir(f64);

impl BhirSource for StaticBhir {
    fn current(&self) -> f64 {
        self.0
    }
}

fn service_with(
    orchestrator: StaticOrchestrator,
    edm: u64,
    bhir: f64,
) -> (Arc<MemoryAuditSink>, GovernanceService) {
    let audit = Arc::new(MemoryAuditSink::new());
    let service = GovernanceService::new(
        Arc::new(MemoryGovernanceStore::new()),
        audit.clone(),
        Arc::new(orchestrator),
        Arc::new(StaticEdm(edm)),
        Arc::new(StaticBhir(bhir)),
        GovernanceConfig::default(),
    );
    (audit, service)
}

fn request(user: &str, scores: DimensionScores) -> TrackRequest {
    TrackRequest {
        user_id: UserId::new(user),
        session_id: SessionId::new("s1"),
        interaction_type: "code_assist".into(),
        skill_category: "python".into(),
        dimension_scores: scores,
        metadata: HashMap::new(),
    }
}

fn healthy_scores() -> DimensionScores {
    DimensionScores {
        decision_quality: 0.9,
        skill_development: 0.85,
        ai_reliance: 0.3,
        bottleneck_resolution: 0.82,
        user_confidence: 0.88,
        engagement: 0.87,
        autonomy_perception: 0.83,
    }
}

#[tokio::test]
async fn healthy_interaction_completes() {
    let (audit, service) = service_with(StaticOrchestrator::default(), 3, 1.4);

    let outcome = service
        .handle_interaction(request("u1", healthy_scores()), "refactor this loop")
        .await
        .unwrap();

    match outcome {
        InteractionOutcome::Completed { snapshot, report } => {
            assert!((snapshot.overall_score - 0.7786).abs() < 1e-4);
            assert!(report.overall_pass);
            assert_eq!(report.evaluations.len(), 4);
        }
        other => panic!("expected completion, got {:?}", other),
    }
    assert_eq!(audit.of_type("gate_evaluated").len(), 4);
    assert!(audit.of_type("breaker_tripped").is_empty());
}

#[tokio::test]
async fn low_dimension_blocks_and_pauses_the_user() {
    let (_, service) = service_with(StaticOrchestrator::default(), 3, 1.4);

    let mut scores = healthy_scores();
    scores.engagement = 0.4;
    let outcome = service
        .handle_interaction(request("u1", scores), "help me again")
        .await
        .unwrap();

    match outcome {
        InteractionOutcome::Blocked { tripped, .. } => {
            assert_eq!(tripped.len(), 1);
            assert!(tripped[0].reason.contains("engagement"));
        }
        other => panic!("expected block, got {:?}", other),
    }

    // The next request from the same user short-circuits
    let next = service
        .handle_interaction(request("u1", healthy_scores()), "hello")
        .await
        .unwrap();
    assert!(matches!(next, InteractionOutcome::Paused(_)));

    // Unrelated users are unaffected
    let other = service
        .handle_interaction(request("u2", healthy_scores()), "hello")
        .await
        .unwrap();
    assert!(matches!(other, InteractionOutcome::Completed { .. }));
}

#[tokio::test]
async fn missing_cancel_capability_blocks_without_tripping() {
    let orchestrator = StaticOrchestrator {
        cancel_capability: false,
        ..StaticOrchestrator::default()
    };
    let (_, service) = service_with(orchestrator, 3, 1.4);

    let outcome = service
        .handle_interaction(request("u1", healthy_scores()), "do the thing")
        .await
        .unwrap();

    match outcome {
        InteractionOutcome::Blocked { report, tripped, .. } => {
            assert!(!report.overall_pass);
            let humanity = report.evaluation(GateName::HumanityOverride).unwrap();
            assert!(!humanity.passed);
            // High severity, not critical: the breaker stays closed
            assert!(tripped.is_empty());
        }
        other => panic!("expected block, got {:?}", other),
    }

    // A definitive per-request outcome, not a pause: the next request
    // is evaluated again
    let next = service
        .handle_interaction(request("u1", healthy_scores()), "again")
        .await
        .unwrap();
    assert!(matches!(next, InteractionOutcome::Blocked { .. }));
}

#[tokio::test]
async fn slow_response_fails_performance_parity() {
    let orchestrator = StaticOrchestrator {
        estimated_latency_ms: 10_000,
        human_baseline_ms: 2_000,
        ..StaticOrchestrator::default()
    };
    let (_, service) = service_with(orchestrator, 3, 0.9);

    // bhir 0.9 <= 1.0 also trips the global breaker
    let outcome = service
        .handle_interaction(request("u1", healthy_scores()), "summarize")
        .await
        .unwrap();

    match outcome {
        InteractionOutcome::Blocked { report, tripped, .. } => {
            assert!(!report.evaluation(GateName::PerformanceParity).unwrap().passed);
            assert!(tripped
                .iter()
                .any(|s| s.scope == ags_types::BreakerScope::Global));
        }
        other => panic!("expected block, got {:?}", other),
    }
}

#[tokio::test]
async fn approved_appeal_unblocks_the_user() {
    let (audit, service) = service_with(StaticOrchestrator::default(), 3, 1.4);

    let mut scores = healthy_scores();
    scores.user_confidence = 0.35;
    let outcome = service
        .handle_interaction(request("u1", scores), "help")
        .await
        .unwrap();
    let tripped = match outcome {
        InteractionOutcome::Blocked { tripped, .. } => tripped,
        other => panic!("expected block, got {:?}", other),
    };

    let appeal = service
        .tribunal()
        .submit_appeal(
            UserId::new("u1"),
            ags_types::ActionId::new("act-1"),
            tripped[0].reason.clone(),
            "the confidence dip was a one-off bad day",
            Priority::High,
        )
        .unwrap();

    for role in StakeholderRole::ALL {
        service
            .tribunal()
            .cast_vote(&appeal.appeal_id, Vote::new(role, VoteDecision::Approve))
            .await
            .unwrap();
    }

    let decided = service.tribunal().get(&appeal.appeal_id).unwrap();
    assert_eq!(decided.status, ags_types::AppealStatus::Closed);
    assert_eq!(audit.of_type("breaker_reset").len(), 1);
    assert_eq!(audit.of_type("user_restored").len(), 1);

    // The user is evaluated again
    let next = service
        .handle_interaction(request("u1", healthy_scores()), "hello")
        .await
        .unwrap();
    assert!(matches!(next, InteractionOutcome::Completed { .. }));
}

#[tokio::test]
async fn denied_appeal_leaves_the_breaker_tripped() {
    use VoteDecision::*;
    let (_, service) = service_with(StaticOrchestrator::default(), 3, 1.4);

    let mut scores = healthy_scores();
    scores.user_confidence = 0.35;
    service
        .handle_interaction(request("u1", scores), "help")
        .await
        .unwrap();

    let appeal = service
        .tribunal()
        .submit_appeal(
            UserId::new("u1"),
            ags_types::ActionId::new("act-1"),
            "breaker trip",
            "disputed",
            Priority::Medium,
        )
        .unwrap();
    let decisions = [Approve, Approve, Approve, Approve, Deny, Deny, Deny];
    let mut report = None;
    for (role, decision) in StakeholderRole::ALL.into_iter().zip(decisions) {
        report = Some(
            service
                .tribunal()
                .cast_vote(&appeal.appeal_id, Vote::new(role, decision))
                .await
                .unwrap(),
        );
    }
    assert_eq!(report.unwrap().outcome, Some(ConsensusOutcome::Denied));

    let next = service
        .handle_interaction(request("u1", healthy_scores()), "hello")
        .await
        .unwrap();
    assert!(matches!(next, InteractionOutcome::Paused(_)));
}

#[tokio::test]
async fn concurrent_interactions_from_one_user_all_land() {
    let (_, service) = service_with(StaticOrchestrator::default(), 3, 1.4);
    let service = Arc::new(service);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                service
                    .handle_interaction(request("u1", healthy_scores()), "task")
                    .await
            })
        })
        .collect();
    for handle in futures::future::join_all(handles).await {
        handle.unwrap().unwrap();
    }

    let trajectory = service
        .ari()
        .get_skill_trajectory(&UserId::new("u1"), "python", 30)
        .unwrap();
    assert_eq!(trajectory.points.len(), 8);
}
