//! ARI engine configuration

/// Tunables for snapshot derivation and the measurement layers.
#[derive(Clone, Debug)]
pub struct AriConfig {
    /// Prior snapshots consulted for the trend (default: 3)
    pub trend_window: usize,
    /// Mean-delta band treated as stable (default: 0.02)
    pub trend_epsilon: f64,
    /// Snapshots (including the new one) consulted for confidence
    /// (default: 5)
    pub confidence_window: usize,
    /// Standard-deviation scale for the confidence penalty
    /// (default: 0.3)
    pub confidence_stdev_scale: f64,
    /// Score at which a skill is considered mastered (default: 0.9)
    pub mastery_threshold: f64,
    /// Weight of the passive lexical layer when blending into the
    /// knowledge-side dimensions (default: 0.3)
    pub passive_weight: f64,
}

impl Default for AriConfig {
    fn default() -> Self {
        Self {
            trend_window: 3,
            trend_epsilon: 0.02,
            confidence_window: 5,
            confidence_stdev_scale: 0.3,
            mastery_threshold: 0.9,
            passive_weight: 0.3,
        }
    }
}
