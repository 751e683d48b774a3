//! Knowledge profiles built from Deep-Dive baseline sessions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// The five ordinal difficulty levels of a Deep-Dive session.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    #[default]
    Foundational,
    Applied,
    Analytical,
    Synthesis,
    Mastery,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 5] = [
        DifficultyLevel::Foundational,
        DifficultyLevel::Applied,
        DifficultyLevel::Analytical,
        DifficultyLevel::Synthesis,
        DifficultyLevel::Mastery,
    ];

    /// Next level up, capped at Mastery.
    pub fn advance(self) -> DifficultyLevel {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[(idx + 1).min(Self::ALL.len() - 1)]
    }

    /// Next level down, floored at Foundational.
    pub fn decrease(self) -> DifficultyLevel {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        Self::ALL[idx.saturating_sub(1)]
    }

    /// Normalized position in [0, 1] across the ladder.
    pub fn as_fraction(self) -> f64 {
        let idx = Self::ALL.iter().position(|l| *l == self).unwrap_or(0);
        idx as f64 / (Self::ALL.len() - 1) as f64
    }
}

/// What a user has demonstrated they can do without assistance in one
/// domain. Created on the first Deep-Dive session for the domain and
/// updated on every graded response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeProfile {
    pub user_id: UserId,
    pub domain: String,
    /// Highest validated capability in [0, 1]; only ever increases
    pub skill_ceiling: f64,
    /// Highest difficulty level at which the user has been graded
    /// Excellent or Proficient
    pub validated_difficulty_level: DifficultyLevel,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeProfile {
    pub fn new(user_id: UserId, domain: impl Into<String>) -> Self {
        Self {
            user_id,
            domain: domain.into(),
            skill_ceiling: 0.0,
            validated_difficulty_level: DifficultyLevel::Foundational,
            updated_at: Utc::now(),
        }
    }

    /// Raise the ceiling after an Excellent/Proficient grading.
    ///
    /// The ceiling is monotonic: a lower score leaves it untouched.
    pub fn raise_ceiling(&mut self, score: f64, level: DifficultyLevel) {
        let validated = score.clamp(0.0, 1.0) * (0.5 + 0.5 * level.as_fraction());
        if validated > self.skill_ceiling {
            self.skill_ceiling = validated;
        }
        if level > self.validated_difficulty_level {
            self.validated_difficulty_level = level;
        }
        self.updated_at = Utc::now();
    }
}
