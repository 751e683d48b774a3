//! Trip evaluation and pause checks

use std::sync::Arc;

use serde_json::json;
use tracing::{error, info};

use ags_audit::{AuditEvent, AuditSeverity, AuditSink};
use ags_store::BreakerStore;
use ags_types::{
    AgencySnapshot, AgsResult, BreakerScope, CircuitBreakerState, Dimension, GateEvaluation,
    UserId,
};

use crate::config::BreakerConfig;

/// The breaker engine. Sole writer of breaker state.
pub struct CircuitBreaker {
    config: BreakerConfig,
    store: Arc<dyn BreakerStore>,
    audit: Arc<dyn AuditSink>,
}

impl CircuitBreaker {
    pub fn new(config: BreakerConfig, store: Arc<dyn BreakerStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            config,
            store,
            audit,
        }
    }

    /// Evaluate all trip conditions for one request.
    ///
    /// Returns the states newly tripped by this call (a user trip and
    /// a global trip can land together). Re-evaluating an
    /// already-tripped scope records nothing new.
    pub fn evaluate(
        &self,
        user: &UserId,
        snapshot: &AgencySnapshot,
        gate_results: &[GateEvaluation],
        edm_unresolved_high_count: u64,
        bhir: f64,
    ) -> AgsResult<Vec<CircuitBreakerState>> {
        let mut candidates: Vec<(BreakerScope, String)> = Vec::new();

        for (dimension, score) in snapshot.scores.iter() {
            // ai_reliance runs the other way (low raw values mean low
            // dependence), so the floor does not apply to it; reliance
            // drift is caught by deskilling detection instead
            if dimension == Dimension::AiReliance {
                continue;
            }
            if score < self.config.dimension_floor {
                candidates.push((
                    BreakerScope::User(user.clone()),
                    format!(
                        "dimension {} score {:.2} below floor {:.2}",
                        dimension.as_str(),
                        score,
                        self.config.dimension_floor
                    ),
                ));
            }
        }

        if edm_unresolved_high_count > self.config.edm_max_unresolved_high {
            candidates.push((
                BreakerScope::Global,
                format!(
                    "{} unresolved high-severity debt items exceed limit {}",
                    edm_unresolved_high_count, self.config.edm_max_unresolved_high
                ),
            ));
        }

        for eval in gate_results {
            for violation in eval.critical_violations() {
                let scope = if violation.global_scope {
                    BreakerScope::Global
                } else {
                    BreakerScope::User(user.clone())
                };
                candidates.push((
                    scope,
                    format!(
                        "critical violation {} on gate {}: {}",
                        violation.kind, eval.gate, violation.detail
                    ),
                ));
            }
        }

        if bhir <= self.config.bhir_floor {
            candidates.push((
                BreakerScope::Global,
                format!("bhir {:.2} at or below floor {:.2}", bhir, self.config.bhir_floor),
            ));
        }

        // One trip per scope per call; the first reason wins
        let mut tripped = Vec::new();
        for (scope, reason) in candidates {
            if tripped
                .iter()
                .any(|s: &CircuitBreakerState| s.scope == scope)
            {
                continue;
            }
            let state = CircuitBreakerState::tripped(scope, reason, self.config.snapshot());
            if self.store.trip(state.clone())? {
                error!(scope = %state.scope, reason = %state.reason, "circuit breaker tripped");
                self.audit.record(
                    AuditEvent::new("breaker_tripped", AuditSeverity::Critical)
                        .for_user(user.clone())
                        .with_details(json!({
                            "scope": state.scope.to_string(),
                            "reason": state.reason,
                        })),
                );
                tripped.push(state);
            }
        }
        Ok(tripped)
    }

    /// Whether requests for this user must short-circuit to a paused
    /// result. A global trip pauses everyone.
    pub fn is_paused(&self, user: &UserId) -> AgsResult<bool> {
        if self.store.get(&BreakerScope::Global)?.is_some() {
            return Ok(true);
        }
        Ok(self.store.get(&BreakerScope::User(user.clone()))?.is_some())
    }

    /// The active state covering this user, if any. Global wins.
    pub fn active_state(&self, user: &UserId) -> AgsResult<Option<CircuitBreakerState>> {
        if let Some(state) = self.store.get(&BreakerScope::Global)? {
            return Ok(Some(state));
        }
        self.store.get(&BreakerScope::User(user.clone()))
    }

    /// Clear a tripped scope. Callers are the tribunal (after an
    /// approved override) and administrative tooling; there is no
    /// automatic cool-down.
    pub fn reset(&self, scope: &BreakerScope) -> AgsResult<bool> {
        let cleared = self.store.clear(scope)?;
        if cleared {
            info!(scope = %scope, "circuit breaker reset");
            self.audit.record(
                AuditEvent::new("breaker_reset", AuditSeverity::Warning).with_details(json!({
                    "scope": scope.to_string(),
                })),
            );
        }
        Ok(cleared)
    }

    /// All currently tripped scopes.
    pub fn active(&self) -> AgsResult<Vec<CircuitBreakerState>> {
        self.store.active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ags_audit::MemoryAuditSink;
    use ags_store::MemoryGovernanceStore;
    use ags_types::{
        DimensionScores, GateName, SessionId, Severity, Trend, Violation,
    };

    fn breaker() -> (Arc<MemoryAuditSink>, CircuitBreaker) {
        let audit = Arc::new(MemoryAuditSink::new());
        let breaker = CircuitBreaker::new(
            BreakerConfig::default(),
            Arc::new(MemoryGovernanceStore::new()),
            audit.clone(),
        );
        (audit, breaker)
    }

    fn snapshot(scores: DimensionScores) -> AgencySnapshot {
        AgencySnapshot::new(
            UserId::new("u1"),
            SessionId::new("s1"),
            "python",
            scores,
            Trend::Stable,
            0.8,
        )
    }

    #[test]
    fn healthy_signals_trip_nothing() {
        let (_, breaker) = breaker();
        let scores = DimensionScores {
            decision_quality: 0.9,
            skill_development: 0.85,
            ai_reliance: 0.3,
            bottleneck_resolution: 0.82,
            user_confidence: 0.88,
            engagement: 0.87,
            autonomy_perception: 0.83,
        };
        let tripped = breaker
            .evaluate(&UserId::new("u1"), &snapshot(scores), &[], 3, 1.4)
            .unwrap();
        assert!(tripped.is_empty());
        assert!(!breaker.is_paused(&UserId::new("u1")).unwrap());
    }

    #[test]
    fn low_dimension_trips_per_user_citing_it() {
        let (audit, breaker) = breaker();
        let mut scores = DimensionScores::uniform(0.8);
        scores.engagement = 0.4;
        let tripped = breaker
            .evaluate(&UserId::new("u1"), &snapshot(scores), &[], 0, 1.4)
            .unwrap();

        assert_eq!(tripped.len(), 1);
        assert_eq!(tripped[0].scope, BreakerScope::User(UserId::new("u1")));
        assert!(tripped[0].reason.contains("engagement"));
        assert!(breaker.is_paused(&UserId::new("u1")).unwrap());
        assert!(!breaker.is_paused(&UserId::new("u2")).unwrap());
        assert_eq!(audit.of_type("breaker_tripped").len(), 1);
    }

    #[test]
    fn ai_reliance_is_exempt_from_the_floor() {
        let (_, breaker) = breaker();
        let mut scores = DimensionScores::uniform(0.8);
        scores.ai_reliance = 0.1;
        let tripped = breaker
            .evaluate(&UserId::new("u1"), &snapshot(scores), &[], 0, 1.4)
            .unwrap();
        assert!(tripped.is_empty());
    }

    #[test]
    fn floored_dimension_wins_over_high_ai_reliance() {
        let (_, breaker) = breaker();
        let mut scores = DimensionScores::uniform(0.8);
        scores.ai_reliance = 0.9;
        scores.user_confidence = 0.4;
        let tripped = breaker
            .evaluate(&UserId::new("u1"), &snapshot(scores), &[], 0, 1.4)
            .unwrap();
        assert_eq!(tripped.len(), 1);
        assert!(tripped[0].reason.contains("user_confidence"));
    }

    #[test]
    fn excess_debt_trips_globally() {
        let (_, breaker) = breaker();
        let tripped = breaker
            .evaluate(
                &UserId::new("u1"),
                &snapshot(DimensionScores::uniform(0.8)),
                &[],
                51,
                1.4,
            )
            .unwrap();
        assert_eq!(tripped.len(), 1);
        assert_eq!(tripped[0].scope, BreakerScope::Global);
        // Global trip pauses unrelated users too
        assert!(breaker.is_paused(&UserId::new("u2")).unwrap());
    }

    #[test]
    fn low_bhir_trips_globally() {
        let (_, breaker) = breaker();
        let tripped = breaker
            .evaluate(
                &UserId::new("u1"),
                &snapshot(DimensionScores::uniform(0.8)),
                &[],
                0,
                1.0,
            )
            .unwrap();
        assert_eq!(tripped.len(), 1);
        assert_eq!(tripped[0].scope, BreakerScope::Global);
    }

    #[test]
    fn critical_gate_violation_scope_follows_flag() {
        let (_, breaker) = breaker();
        let user_violation = GateEvaluation::fail(
            GateName::ExtractionAnalysis,
            0.0,
            vec![Violation::new("dark_pattern", Severity::Critical, "coercive plan")],
        );
        let global_violation = GateEvaluation::fail(
            GateName::NetAgency,
            0.0,
            vec![Violation::new("evaluation_error", Severity::Critical, "panic").global()],
        );
        let tripped = breaker
            .evaluate(
                &UserId::new("u1"),
                &snapshot(DimensionScores::uniform(0.8)),
                &[user_violation, global_violation],
                0,
                1.4,
            )
            .unwrap();

        let scopes: Vec<_> = tripped.iter().map(|s| s.scope.clone()).collect();
        assert!(scopes.contains(&BreakerScope::User(UserId::new("u1"))));
        assert!(scopes.contains(&BreakerScope::Global));
    }

    #[test]
    fn retrip_of_active_scope_is_idempotent() {
        let (audit, breaker) = breaker();
        let mut scores = DimensionScores::uniform(0.8);
        scores.engagement = 0.4;
        let snapshot = snapshot(scores);
        let user = UserId::new("u1");

        let first = breaker.evaluate(&user, &snapshot, &[], 0, 1.4).unwrap();
        let second = breaker.evaluate(&user, &snapshot, &[], 0, 1.4).unwrap();
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        assert_eq!(audit.of_type("breaker_tripped").len(), 1);
    }

    #[test]
    fn reset_clears_the_pause() {
        let (audit, breaker) = breaker();
        let mut scores = DimensionScores::uniform(0.8);
        scores.engagement = 0.4;
        let user = UserId::new("u1");
        breaker.evaluate(&user, &snapshot(scores), &[], 0, 1.4).unwrap();
        assert!(breaker.is_paused(&user).unwrap());

        let scope = BreakerScope::User(user.clone());
        assert!(breaker.reset(&scope).unwrap());
        assert!(!breaker.is_paused(&user).unwrap());
        assert_eq!(audit.of_type("breaker_reset").len(), 1);

        // Nothing left to clear
        assert!(!breaker.reset(&scope).unwrap());
    }
}
