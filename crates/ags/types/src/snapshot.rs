//! Per-interaction agency snapshots
//!
//! An AgencySnapshot is immutable once written and appended to the
//! user's ordered history. The overall score is always the arithmetic
//! mean of the seven dimension scores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dimensions::DimensionScores;
use crate::ids::{SessionId, UserId};

/// Direction of a user's autonomy over the trend window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    #[default]
    Stable,
    Declining,
}

/// One measurement of a user's agency, taken per interaction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgencySnapshot {
    /// The user being measured
    pub user_id: UserId,
    /// The session the interaction belonged to
    pub session_id: SessionId,
    /// Skill category of the interaction (e.g. "python", "prose")
    pub skill_category: String,
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
    /// The seven dimension scores, each in [0, 1]
    pub scores: DimensionScores,
    /// Arithmetic mean of the seven dimensions
    pub overall_score: f64,
    /// Trend over the last three snapshots (Stable until enough history)
    pub trend: Trend,
    /// Measurement confidence in [0, 1]
    pub confidence: f64,
    /// Set when the snapshot could not be persisted and gating must
    /// fall back to its conservative policy
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}

impl AgencySnapshot {
    /// Build a snapshot from validated scores.
    ///
    /// Callers must have run `DimensionScores::validate` first; the
    /// overall score is derived here, never supplied.
    pub fn new(
        user_id: UserId,
        session_id: SessionId,
        skill_category: impl Into<String>,
        scores: DimensionScores,
        trend: Trend,
        confidence: f64,
    ) -> Self {
        Self {
            user_id,
            session_id,
            skill_category: skill_category.into(),
            timestamp: Utc::now(),
            overall_score: scores.mean(),
            scores,
            trend,
            confidence,
            degraded: false,
        }
    }
}
