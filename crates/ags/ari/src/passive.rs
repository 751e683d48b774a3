//! Passive lexical layer
//!
//! Continuously observes user text in the background and keeps a
//! per-user estimate of self-directedness, blended at low weight into
//! the knowledge-side dimensions (skill development, decision quality)
//! before a snapshot is taken. It never blocks or gates anything on
//! its own.

use dashmap::DashMap;

use ags_types::{DimensionScores, UserId};

/// Markers of a user working through a problem themselves.
const SELF_DIRECTED_MARKERS: &[&str] = &[
    "i tried",
    "my approach",
    "i think",
    "let me",
    "i wrote",
    "i compared",
    "my plan",
    "i checked",
];

/// Markers of wholesale delegation to the assistant.
const RELIANCE_MARKERS: &[&str] = &[
    "do it for me",
    "just give me",
    "write it all",
    "fix it for me",
    "i don't understand any of this",
    "just do everything",
];

/// Smoothing factor for the per-user running estimate.
const EWMA_ALPHA: f64 = 0.3;

/// Background lexical scorer with a per-user running estimate.
#[derive(Default)]
pub struct PassiveLexicalLayer {
    estimates: DashMap<UserId, f64>,
}

impl PassiveLexicalLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Score one piece of text in [0, 1]; 0.5 is neutral.
    fn score_text(text: &str) -> f64 {
        let lower = text.to_lowercase();
        let self_directed = SELF_DIRECTED_MARKERS
            .iter()
            .filter(|m| lower.contains(*m))
            .count() as f64;
        let reliant = RELIANCE_MARKERS
            .iter()
            .filter(|m| lower.contains(*m))
            .count() as f64;
        let total = self_directed + reliant;
        if total == 0.0 {
            return 0.5;
        }
        (0.5 + 0.5 * (self_directed - reliant) / total).clamp(0.0, 1.0)
    }

    /// Observe user text and update the running estimate.
    pub fn observe(&self, user: &UserId, text: &str) -> f64 {
        let observation = Self::score_text(text);
        let mut entry = self.estimates.entry(user.clone()).or_insert(observation);
        *entry = (1.0 - EWMA_ALPHA) * *entry + EWMA_ALPHA * observation;
        *entry
    }

    /// Current estimate for a user, if any text has been observed.
    pub fn estimate(&self, user: &UserId) -> Option<f64> {
        self.estimates.get(user).map(|e| *e)
    }

    /// Blend the passive estimate into the knowledge-side dimensions
    /// at the given weight. Scores pass through untouched when no
    /// estimate exists yet.
    pub fn blend(&self, user: &UserId, mut scores: DimensionScores, weight: f64) -> DimensionScores {
        let Some(passive) = self.estimate(user) else {
            return scores;
        };
        let active_weight = 1.0 - weight;
        scores.skill_development =
            (active_weight * scores.skill_development + weight * passive).clamp(0.0, 1.0);
        scores.decision_quality =
            (active_weight * scores.decision_quality + weight * passive).clamp(0.0, 1.0);
        scores
    }
}
