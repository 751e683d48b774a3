//! Skill trajectories: history, velocity, projected mastery

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ags_types::UserId;

/// One (time, score) sample in a trajectory.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    pub timestamp: DateTime<Utc>,
    pub score: f64,
}

/// A user's fitted progress curve for one skill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SkillTrajectory {
    pub user_id: UserId,
    pub skill: String,
    /// Samples inside the requested window, oldest first
    pub points: Vec<TrajectoryPoint>,
    /// Least-squares slope of overall score per day
    pub velocity_per_day: f64,
    /// When the fitted line crosses the mastery threshold; None when
    /// the slope is flat or negative
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_mastery: Option<DateTime<Utc>>,
}
