//! Deep-Dive layer
//!
//! Opt-in baseline sessions: an adaptive Socratic dialogue across five
//! ordinal difficulty levels. Each response is graded by the synthesis
//! rubric; strong answers climb the ladder and raise the knowledge
//! profile's skill ceiling, weak ones hold with a scaffold hint or
//! offer to step down. A session ends only on explicit user exit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ags_types::{AgsError, AgsResult, DifficultyLevel, SessionId, UserId};

use crate::copilot::TaskCategory;

/// Rubric scores for one Deep-Dive response, each in [0, 1].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SynthesisRubric {
    pub accuracy: f64,
    pub logic: f64,
    pub completeness: f64,
}

impl SynthesisRubric {
    pub fn new(accuracy: f64, logic: f64, completeness: f64) -> Self {
        Self {
            accuracy,
            logic,
            completeness,
        }
    }

    pub fn validate(&self) -> AgsResult<()> {
        for (name, value) in [
            ("accuracy", self.accuracy),
            ("logic", self.logic),
            ("completeness", self.completeness),
        ] {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(AgsError::InvalidInput(format!(
                    "rubric {} score {} outside [0, 1]",
                    name, value
                )));
            }
        }
        Ok(())
    }

    /// Weighted overall: 0.35 accuracy + 0.35 logic + 0.30 completeness.
    pub fn overall(&self) -> f64 {
        0.35 * self.accuracy + 0.35 * self.logic + 0.30 * self.completeness
    }
}

/// Quality bucket for a graded response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBucket {
    Excellent,
    Proficient,
    Developing,
    Struggling,
    Insufficient,
}

impl QualityBucket {
    pub fn from_score(score: f64) -> QualityBucket {
        if score >= 0.85 {
            QualityBucket::Excellent
        } else if score >= 0.70 {
            QualityBucket::Proficient
        } else if score >= 0.50 {
            QualityBucket::Developing
        } else if score >= 0.30 {
            QualityBucket::Struggling
        } else {
            QualityBucket::Insufficient
        }
    }

    /// Excellent/Proficient answers validate capability at the level
    /// they were given.
    pub fn validates_level(&self) -> bool {
        matches!(self, QualityBucket::Excellent | QualityBucket::Proficient)
    }
}

/// What the session does next after a graded response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StepOutcome {
    /// Climbed one difficulty level (capped at Mastery)
    Advanced { new_level: DifficultyLevel },
    /// Held the level; a scaffold hint is offered
    Hold { scaffold_hint: String },
    /// Offered to decrease difficulty (or exit); nothing changes until
    /// the user accepts
    OfferDecrease { suggested: DifficultyLevel },
}

/// Result of grading one response, as returned to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeepDiveStep {
    pub bucket: QualityBucket,
    pub outcome: StepOutcome,
    /// Skill ceiling after any profile update
    pub skill_ceiling: f64,
}

/// An in-flight Deep-Dive session.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeepDiveSession {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub domain: String,
    pub category: TaskCategory,
    pub level: DifficultyLevel,
    pub graded_count: u32,
    pub ended: bool,
    pub started_at: DateTime<Utc>,
}

impl DeepDiveSession {
    pub fn new(
        user_id: UserId,
        domain: impl Into<String>,
        category: TaskCategory,
        level: DifficultyLevel,
    ) -> Self {
        Self {
            session_id: SessionId::generate(),
            user_id,
            domain: domain.into(),
            category,
            level,
            graded_count: 0,
            ended: false,
            started_at: Utc::now(),
        }
    }

    /// Grade a response and step the ladder. The caller applies any
    /// profile update from the returned bucket.
    pub fn grade(&mut self, rubric: &SynthesisRubric) -> AgsResult<(QualityBucket, StepOutcome)> {
        if self.ended {
            return Err(AgsError::SessionClosed(self.session_id.clone()));
        }
        rubric.validate()?;
        self.graded_count += 1;

        let bucket = QualityBucket::from_score(rubric.overall());
        let outcome = match bucket {
            QualityBucket::Excellent | QualityBucket::Proficient => {
                self.level = self.level.advance();
                StepOutcome::Advanced {
                    new_level: self.level,
                }
            }
            QualityBucket::Developing | QualityBucket::Struggling => StepOutcome::Hold {
                scaffold_hint: scaffold_hint(self.category, self.level),
            },
            QualityBucket::Insufficient => StepOutcome::OfferDecrease {
                suggested: self.level.decrease(),
            },
        };
        Ok((bucket, outcome))
    }

    /// Accept a previously offered decrease.
    pub fn accept_decrease(&mut self) -> AgsResult<DifficultyLevel> {
        if self.ended {
            return Err(AgsError::SessionClosed(self.session_id.clone()));
        }
        self.level = self.level.decrease();
        Ok(self.level)
    }

    /// Explicit user exit, always available.
    pub fn end(&mut self) {
        self.ended = true;
    }
}

/// Scaffold hints keyed by category and ladder position.
fn scaffold_hint(category: TaskCategory, level: DifficultyLevel) -> String {
    let base = match category {
        TaskCategory::Code => "walk through the algorithm on a three-element input first",
        TaskCategory::Writing => "state the single claim the paragraph must land",
        TaskCategory::Analysis => "write down what you would expect if the hypothesis were false",
    };
    format!("At the {:?} level: {}", level, base)
}
