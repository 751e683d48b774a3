//! Circuit-breaker state
//!
//! At most one active state exists per scope. The state is owned and
//! mutated only by the breaker engine; the tribunal requests a reset
//! but never writes the record itself.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// What a breaker trip applies to: one user's requests, or everything.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerScope {
    User(UserId),
    Global,
}

impl std::fmt::Display for BreakerScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerScope::User(user) => write!(f, "user:{}", user),
            BreakerScope::Global => write!(f, "global"),
        }
    }
}

/// The thresholds that were in force when a trip decision was made.
/// Captured on the state so a later audit or appeal sees the exact
/// configuration, not the current one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsSnapshot {
    pub dimension_floor: f64,
    pub edm_max_unresolved_high: u64,
    pub bhir_floor: f64,
}

/// An active (or historical) circuit-breaker record for one scope.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub scope: BreakerScope,
    pub active: bool,
    pub reason: String,
    pub triggered_at: DateTime<Utc>,
    pub thresholds: ThresholdsSnapshot,
}

impl CircuitBreakerState {
    pub fn tripped(
        scope: BreakerScope,
        reason: impl Into<String>,
        thresholds: ThresholdsSnapshot,
    ) -> Self {
        Self {
            scope,
            active: true,
            reason: reason.into(),
            triggered_at: Utc::now(),
            thresholds,
        }
    }
}
