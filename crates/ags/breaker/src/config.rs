//! Breaker thresholds

use serde::{Deserialize, Serialize};

use ags_types::ThresholdsSnapshot;

/// Trip thresholds. A snapshot of these is frozen onto every trip
/// record so later review sees the configuration that was in force.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct BreakerConfig {
    /// Any dimension below this trips the user's breaker
    pub dimension_floor: f64,
    /// More unresolved high-severity epistemic debt than this trips
    /// the global breaker
    pub edm_max_unresolved_high: u64,
    /// BHIR at or below this trips the global breaker
    pub bhir_floor: f64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            dimension_floor: 0.5,
            edm_max_unresolved_high: 50,
            bhir_floor: 1.0,
        }
    }
}

impl BreakerConfig {
    pub fn snapshot(&self) -> ThresholdsSnapshot {
        ThresholdsSnapshot {
            dimension_floor: self.dimension_floor,
            edm_max_unresolved_high: self.edm_max_unresolved_high,
            bhir_floor: self.bhir_floor,
        }
    }
}
