//! Deskilling detection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ags_types::{Dimension, UserId};

/// How bad a detected capability drop is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeskillingSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Raised when a user's ARI has dropped more than the caller's
/// threshold over the trend window.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeskillingAlert {
    pub user_id: UserId,
    /// Overall-score drop across the window (positive number)
    pub drop: f64,
    /// Dimensions that individually fell by more than the threshold
    pub affected_dimensions: Vec<Dimension>,
    pub severity: DeskillingSeverity,
    pub detected_at: DateTime<Utc>,
}

impl DeskillingAlert {
    /// Severity scales with the magnitude of the drop and the number
    /// of affected dimensions.
    pub fn severity_for(drop: f64, threshold: f64, affected: usize) -> DeskillingSeverity {
        if drop > 2.0 * threshold || affected >= 5 {
            DeskillingSeverity::Critical
        } else if drop > 1.5 * threshold || affected >= 4 {
            DeskillingSeverity::High
        } else if affected >= 2 {
            DeskillingSeverity::Medium
        } else {
            DeskillingSeverity::Low
        }
    }
}
