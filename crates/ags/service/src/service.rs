//! The governance pipeline

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use ags_ari::{AriConfig, AriEngine, TrackRequest};
use ags_audit::AuditSink;
use ags_breaker::{BreakerConfig, CircuitBreaker, EdmProbe};
use ags_gates::{GateConfig, GateInput, GateReport, GateValidator};
use ags_store::{AppealStore, BreakerStore, ProfileStore, SnapshotStore};
use ags_tribunal::{SlaScheduler, TribunalService};
use ags_types::{ActionId, AgencySnapshot, AgsError, AgsResult, CircuitBreakerState};

use crate::collaborators::{BhirSource, BreakerReversal, ModelOrchestrator};

/// Configuration for the whole pipeline.
#[derive(Clone, Debug, Default)]
pub struct GovernanceConfig {
    pub ari: AriConfig,
    pub gates: GateConfig,
    pub breaker: BreakerConfig,
}

/// How one interaction came out of the pipeline.
#[derive(Clone, Debug)]
pub enum InteractionOutcome {
    /// A breaker covering this user is active; nothing was evaluated
    Paused(CircuitBreakerState),
    /// Gates failed or a breaker tripped on this interaction
    Blocked {
        snapshot: AgencySnapshot,
        report: GateReport,
        tripped: Vec<CircuitBreakerState>,
    },
    /// All gates passed and no breaker tripped
    Completed {
        snapshot: AgencySnapshot,
        report: GateReport,
    },
}

/// The facade embedding applications drive.
pub struct GovernanceService {
    ari: AriEngine,
    gates: GateValidator,
    breaker: Arc<CircuitBreaker>,
    tribunal: TribunalService,
    scheduler: Arc<SlaScheduler>,
    snapshots: Arc<dyn SnapshotStore>,
    orchestrator: Arc<dyn ModelOrchestrator>,
    edm: Arc<dyn EdmProbe>,
    bhir: Arc<dyn BhirSource>,
}

impl GovernanceService {
    pub fn new<S>(
        store: Arc<S>,
        audit: Arc<dyn AuditSink>,
        orchestrator: Arc<dyn ModelOrchestrator>,
        edm: Arc<dyn EdmProbe>,
        bhir: Arc<dyn BhirSource>,
        config: GovernanceConfig,
    ) -> Self
    where
        S: SnapshotStore + ProfileStore + AppealStore + BreakerStore + 'static,
    {
        let breaker = Arc::new(CircuitBreaker::new(
            config.breaker,
            store.clone(),
            audit.clone(),
        ));
        let reversal = Arc::new(BreakerReversal::new(breaker.clone(), audit.clone()));
        let tribunal = TribunalService::new(store.clone(), audit.clone(), reversal);
        let scheduler = Arc::new(SlaScheduler::new(store.clone(), audit.clone()));

        Self {
            ari: AriEngine::new(store.clone(), store.clone(), audit.clone(), config.ari),
            gates: GateValidator::new(config.gates, audit),
            breaker,
            tribunal,
            scheduler,
            snapshots: store,
            orchestrator,
            edm,
            bhir,
        }
    }

    /// Run one interaction through the full pipeline: measure, gate,
    /// and feed the breaker. A user covered by an active breaker gets
    /// a paused result without anything being evaluated.
    pub async fn handle_interaction(
        &self,
        request: TrackRequest,
        prompt: &str,
    ) -> AgsResult<InteractionOutcome> {
        let user = request.user_id.clone();

        if let Some(state) = self.breaker.active_state(&user)? {
            debug!(user = %user, scope = %state.scope, "request short-circuited by breaker");
            return Ok(InteractionOutcome::Paused(state));
        }

        // Previous snapshot is read before tracking so the gates can
        // measure the delta this interaction produced
        let previous = match self.snapshots.latest(&user) {
            Ok(previous) => previous,
            Err(AgsError::StoreUnavailable(_)) => None,
            Err(e) => return Err(e),
        };
        let snapshot = self.ari.track_interaction(request)?;

        let planned = self.orchestrator.plan_response(&user, prompt).await?;
        let bhir = self.bhir.current();
        let input = GateInput {
            action_id: ActionId::generate(),
            user_id: user.clone(),
            snapshot: Some(snapshot.clone()),
            previous,
            plan: planned.plan,
            estimated_latency_ms: planned.estimated_latency_ms,
            human_baseline_ms: planned.human_baseline_ms,
            bhir,
        };
        let report = self.gates.validate(input).await;

        let edm_count = self.edm.unresolved_high_severity_debt_count(&user).await?;
        let tripped = self
            .breaker
            .evaluate(&user, &snapshot, &report.evaluations, edm_count, bhir)?;

        if !report.overall_pass || !tripped.is_empty() {
            info!(
                user = %user,
                action = %report.action_id,
                tripped = tripped.len(),
                "interaction blocked"
            );
            return Ok(InteractionOutcome::Blocked {
                snapshot,
                report,
                tripped,
            });
        }
        Ok(InteractionOutcome::Completed { snapshot, report })
    }

    /// Start the background SLA loop. The handle aborts the loop when
    /// dropped by the caller's runtime shutdown.
    pub fn spawn_sla_scheduler(&self, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(Arc::clone(&self.scheduler).run(period))
    }

    pub fn ari(&self) -> &AriEngine {
        &self.ari
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    pub fn tribunal(&self) -> &TribunalService {
        &self.tribunal
    }

    pub fn sla_scheduler(&self) -> &SlaScheduler {
        &self.scheduler
    }
}
