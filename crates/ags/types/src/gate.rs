//! Gate evaluation results
//!
//! Exactly four evaluations are produced per request, one per gate.
//! They are handed to the circuit breaker and the audit sink, then
//! discarded; the long-term record is the audit trail.

use serde::{Deserialize, Serialize};

/// The four independent safety gates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateName {
    NetAgency,
    ExtractionAnalysis,
    HumanityOverride,
    PerformanceParity,
}

impl GateName {
    pub const ALL: [GateName; 4] = [
        GateName::NetAgency,
        GateName::ExtractionAnalysis,
        GateName::HumanityOverride,
        GateName::PerformanceParity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            GateName::NetAgency => "net_agency",
            GateName::ExtractionAnalysis => "extraction_analysis",
            GateName::HumanityOverride => "humanity_override",
            GateName::PerformanceParity => "performance_parity",
        }
    }
}

impl std::fmt::Display for GateName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a violation, ordered from Low to Critical.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Low,
    Medium,
    High,
    Critical,
}

/// A single rule violation found during gate evaluation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Machine-readable violation code (e.g. "dark_pattern",
    /// "evaluation_error", "degraded_mode")
    pub kind: String,
    pub severity: Severity,
    pub detail: String,
    /// Critical violations with this flag trip the breaker globally
    /// instead of per-user
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub global_scope: bool,
}

impl Violation {
    pub fn new(kind: impl Into<String>, severity: Severity, detail: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            severity,
            detail: detail.into(),
            global_scope: false,
        }
    }

    pub fn global(mut self) -> Self {
        self.global_scope = true;
        self
    }
}

/// Outcome of one gate for one request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateEvaluation {
    pub gate: GateName,
    pub passed: bool,
    /// Gate-specific score in [0, 1]
    pub score: f64,
    pub violations: Vec<Violation>,
}

impl GateEvaluation {
    pub fn pass(gate: GateName, score: f64) -> Self {
        Self {
            gate,
            passed: true,
            score: score.clamp(0.0, 1.0),
            violations: Vec::new(),
        }
    }

    pub fn fail(gate: GateName, score: f64, violations: Vec<Violation>) -> Self {
        Self {
            gate,
            passed: false,
            score: score.clamp(0.0, 1.0),
            violations,
        }
    }

    /// Highest violation severity, if any violation was recorded.
    pub fn max_severity(&self) -> Option<Severity> {
        self.violations.iter().map(|v| v.severity).max()
    }

    /// A gate carrying a violation at or above the floor fails
    /// regardless of its numeric score.
    pub fn effective_pass(&self, severity_fail_floor: Severity) -> bool {
        if self
            .max_severity()
            .is_some_and(|s| s >= severity_fail_floor)
        {
            return false;
        }
        self.passed
    }

    pub fn critical_violations(&self) -> impl Iterator<Item = &Violation> {
        self.violations
            .iter()
            .filter(|v| v.severity == Severity::Critical)
    }
}
