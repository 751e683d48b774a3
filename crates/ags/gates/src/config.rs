//! Gate thresholds

use serde::{Deserialize, Serialize};

use ags_types::Severity;

/// Thresholds for the four gates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GateConfig {
    /// Minimum acceptable agency delta for the Net Agency gate
    pub net_agency_floor: f64,
    /// Performance Parity allows latency up to baseline * this ratio
    pub max_latency_ratio: f64,
    /// A violation at or above this severity forces its gate to fail
    pub severity_fail_floor: Severity,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            net_agency_floor: 0.0,
            max_latency_ratio: 2.0,
            severity_fail_floor: Severity::High,
        }
    }
}
