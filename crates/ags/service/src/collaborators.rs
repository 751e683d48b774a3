//! External collaborator seams
//!
//! The governance pipeline consumes a model orchestrator (response
//! plans and latency estimates) and a BHIR source, and exposes the
//! breaker-backed reversal the tribunal calls after an approved
//! appeal.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;
use tracing::info;

use ags_audit::{AuditEvent, AuditSeverity, AuditSink};
use ags_breaker::CircuitBreaker;
use ags_gates::ResponsePlan;
use ags_tribunal::BlockReversal;
use ags_types::{ActionId, AgsResult, BreakerScope, UserId};

/// A proposed response with the orchestrator's latency estimates.
#[derive(Clone, Debug)]
pub struct PlannedResponse {
    pub plan: ResponsePlan,
    pub estimated_latency_ms: u64,
    pub human_baseline_ms: u64,
}

/// Supplies response plans for gate evaluation.
#[async_trait]
pub trait ModelOrchestrator: Send + Sync {
    async fn plan_response(&self, user: &UserId, prompt: &str) -> AgsResult<PlannedResponse>;
}

/// Supplies the current system-wide Beyond-Horizon Impact Ratio.
pub trait BhirSource: Send + Sync {
    fn current(&self) -> f64;
}

/// Tribunal-facing reversal backed by the circuit breaker.
///
/// The Override step resets the user's tripped scope through the
/// breaker engine (the breaker remains the sole writer of its state);
/// the Restore step is recorded on the audit trail for downstream
/// systems that hold the user's pre-block context.
pub struct BreakerReversal {
    breaker: Arc<CircuitBreaker>,
    audit: Arc<dyn AuditSink>,
}

impl BreakerReversal {
    pub fn new(breaker: Arc<CircuitBreaker>, audit: Arc<dyn AuditSink>) -> Self {
        Self { breaker, audit }
    }
}

#[async_trait]
impl BlockReversal for BreakerReversal {
    async fn reverse(&self, user: &UserId, action: &ActionId) -> AgsResult<()> {
        let cleared = self.breaker.reset(&BreakerScope::User(user.clone()))?;
        info!(user = %user, action = %action, cleared, "tribunal override applied");
        Ok(())
    }

    async fn restore(&self, user: &UserId) -> AgsResult<()> {
        self.audit.record(
            AuditEvent::new("user_restored", AuditSeverity::Info)
                .for_user(user.clone())
                .with_details(json!({ "restored_by": "tribunal" })),
        );
        Ok(())
    }
}
