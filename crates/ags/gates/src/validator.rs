//! Parallel gate fan-out

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use ags_audit::{AuditEvent, AuditSeverity, AuditSink};
use ags_types::{ActionId, GateEvaluation, GateName, Severity, UserId, Violation};

use crate::config::GateConfig;
use crate::evaluators;
use crate::input::GateInput;

/// Combined outcome of the four gates for one request.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GateReport {
    pub action_id: ActionId,
    pub user_id: UserId,
    /// One evaluation per gate, in `GateName::ALL` order
    pub evaluations: Vec<GateEvaluation>,
    pub overall_pass: bool,
}

impl GateReport {
    pub fn evaluation(&self, gate: GateName) -> Option<&GateEvaluation> {
        self.evaluations.iter().find(|e| e.gate == gate)
    }
}

/// Runs the four gates concurrently and reports the joined result.
pub struct GateValidator {
    config: GateConfig,
    audit: Arc<dyn AuditSink>,
}

impl GateValidator {
    pub fn new(config: GateConfig, audit: Arc<dyn AuditSink>) -> Self {
        Self { config, audit }
    }

    /// Evaluate all four gates against one request.
    ///
    /// Evaluators run as independent tasks over the shared immutable
    /// input and are joined here. A task that panics is reported as a
    /// failed gate carrying an `evaluation_error` violation, never as
    /// a silent pass.
    pub async fn validate(&self, input: GateInput) -> GateReport {
        let input = Arc::new(input);
        let config = self.config;

        let handles: Vec<_> = GateName::ALL
            .into_iter()
            .map(|gate| {
                let input = Arc::clone(&input);
                tokio::spawn(async move { run_gate(gate, &input, &config) })
            })
            .collect();

        let evaluations: Vec<GateEvaluation> = join_all(handles)
            .await
            .into_iter()
            .zip(GateName::ALL)
            .map(|(joined, gate)| match joined {
                Ok(eval) => eval,
                Err(e) => {
                    warn!(gate = %gate, error = %e, "gate evaluator task failed");
                    fail_closed(gate, &e.to_string())
                }
            })
            .collect();

        let overall_pass = evaluations
            .iter()
            .all(|e| e.effective_pass(self.config.severity_fail_floor));

        for eval in &evaluations {
            self.audit.record(
                AuditEvent::new(
                    "gate_evaluated",
                    if eval.passed {
                        AuditSeverity::Info
                    } else {
                        AuditSeverity::Warning
                    },
                )
                .for_user(input.user_id.clone())
                .with_details(json!({
                    "action_id": input.action_id.as_str(),
                    "gate": eval.gate.as_str(),
                    "passed": eval.passed,
                    "score": eval.score,
                    "violations": eval.violations.len(),
                })),
            );
        }
        debug!(
            action = %input.action_id,
            user = %input.user_id,
            overall_pass,
            "gates evaluated"
        );

        GateReport {
            action_id: input.action_id.clone(),
            user_id: input.user_id.clone(),
            evaluations,
            overall_pass,
        }
    }
}

fn run_gate(gate: GateName, input: &GateInput, config: &GateConfig) -> GateEvaluation {
    match gate {
        GateName::NetAgency => evaluators::net_agency(input, config),
        GateName::ExtractionAnalysis => evaluators::extraction_analysis(input, config),
        GateName::HumanityOverride => evaluators::humanity_override(input, config),
        GateName::PerformanceParity => evaluators::performance_parity(input, config),
    }
}

/// Fail-closed stand-in for an evaluator that did not complete.
fn fail_closed(gate: GateName, detail: &str) -> GateEvaluation {
    GateEvaluation::fail(
        gate,
        0.0,
        vec![Violation::new(
            "evaluation_error",
            Severity::Critical,
            format!("evaluator did not complete: {}", detail),
        )],
    )
}
