//! The four gate evaluators
//!
//! Each is a pure function over the shared input. They never touch
//! shared mutable state, so the validator can run them in parallel
//! without locking.

use ags_types::{Dimension, GateEvaluation, GateName, Severity, Violation};

use crate::config::GateConfig;
use crate::input::GateInput;
use crate::lexicon::scan_plan;

/// The dimensions the Net Agency gate reads deltas from.
const NET_AGENCY_DIMENSIONS: [Dimension; 2] =
    [Dimension::SkillDevelopment, Dimension::DecisionQuality];

/// Gate 1: the interaction must not erode the user's agency.
///
/// Compares the knowledge-side dimensions of the latest snapshot
/// against the previous one; the mean delta must clear the configured
/// floor. Fails closed when no usable snapshot exists or the latest
/// one is marked degraded.
pub fn net_agency(input: &GateInput, config: &GateConfig) -> GateEvaluation {
    let snapshot = match &input.snapshot {
        Some(snapshot) if !snapshot.degraded => snapshot,
        Some(_) => {
            return GateEvaluation::fail(
                GateName::NetAgency,
                0.0,
                vec![Violation::new(
                    "degraded_mode",
                    Severity::High,
                    "latest snapshot was taken while persistence was unreachable",
                )],
            );
        }
        None => {
            return GateEvaluation::fail(
                GateName::NetAgency,
                0.0,
                vec![Violation::new(
                    "degraded_mode",
                    Severity::High,
                    "no agency snapshot recorded for user",
                )],
            );
        }
    };

    // First tracked interaction: no delta to measure yet
    let delta = match &input.previous {
        Some(previous) => {
            let sum: f64 = NET_AGENCY_DIMENSIONS
                .iter()
                .map(|d| snapshot.scores.get(*d) - previous.scores.get(*d))
                .sum();
            sum / NET_AGENCY_DIMENSIONS.len() as f64
        }
        None => 0.0,
    };

    let score = (0.5 + delta / 2.0).clamp(0.0, 1.0);
    if delta >= config.net_agency_floor {
        GateEvaluation::pass(GateName::NetAgency, score)
    } else {
        GateEvaluation::fail(
            GateName::NetAgency,
            score,
            vec![Violation::new(
                "net_agency_floor",
                Severity::Medium,
                format!(
                    "agency delta {:.3} below floor {:.3}",
                    delta, config.net_agency_floor
                ),
            )],
        )
    }
}

/// Gate 2: static extraction scan of the plan text.
///
/// Any high-severity lexicon match fails the gate; medium matches are
/// recorded on a passing evaluation.
pub fn extraction_analysis(input: &GateInput, _config: &GateConfig) -> GateEvaluation {
    let violations = scan_plan(&input.plan.text);
    let high = violations
        .iter()
        .filter(|v| v.severity >= Severity::High)
        .count();
    let score = (1.0 - 0.3 * violations.len() as f64).clamp(0.0, 1.0);

    if high > 0 {
        GateEvaluation::fail(GateName::ExtractionAnalysis, score, violations)
    } else {
        let mut eval = GateEvaluation::pass(GateName::ExtractionAnalysis, score);
        eval.violations = violations;
        eval
    }
}

/// Gate 3: the user must always be able to cancel or override.
pub fn humanity_override(input: &GateInput, _config: &GateConfig) -> GateEvaluation {
    if input.plan.cancel_capability {
        GateEvaluation::pass(GateName::HumanityOverride, 1.0)
    } else {
        GateEvaluation::fail(
            GateName::HumanityOverride,
            0.0,
            vec![Violation::new(
                "no_cancel_capability",
                Severity::High,
                "response plan exposes no cancel or override control",
            )],
        )
    }
}

/// Gate 4: AI assistance must not be slower than doing it yourself.
///
/// Latency must stay within `max_latency_ratio` of the human baseline,
/// unless the beyond-horizon impact ratio shows the action pays for
/// itself (BHIR > 1.0).
pub fn performance_parity(input: &GateInput, config: &GateConfig) -> GateEvaluation {
    let budget_ms = input.human_baseline_ms as f64 * config.max_latency_ratio;
    let ratio = if budget_ms > 0.0 {
        input.estimated_latency_ms as f64 / budget_ms
    } else {
        f64::INFINITY
    };
    let score = (1.0 / ratio.max(1.0)).clamp(0.0, 1.0);

    if input.estimated_latency_ms as f64 <= budget_ms || input.bhir > 1.0 {
        GateEvaluation::pass(GateName::PerformanceParity, score)
    } else {
        GateEvaluation::fail(
            GateName::PerformanceParity,
            score,
            vec![Violation::new(
                "latency_over_budget",
                Severity::Medium,
                format!(
                    "estimated {}ms exceeds budget {:.0}ms and bhir {:.2} <= 1.0",
                    input.estimated_latency_ms, budget_ms, input.bhir
                ),
            )],
        )
    }
}
