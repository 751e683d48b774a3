//! The seven autonomy dimensions and their per-interaction scores

use serde::{Deserialize, Serialize};

use crate::errors::{AgsError, AgsResult};

/// One of the seven autonomy dimensions measured per interaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    DecisionQuality,
    SkillDevelopment,
    AiReliance,
    BottleneckResolution,
    UserConfidence,
    Engagement,
    AutonomyPerception,
}

impl Dimension {
    /// All seven dimensions, in canonical order.
    pub const ALL: [Dimension; 7] = [
        Dimension::DecisionQuality,
        Dimension::SkillDevelopment,
        Dimension::AiReliance,
        Dimension::BottleneckResolution,
        Dimension::UserConfidence,
        Dimension::Engagement,
        Dimension::AutonomyPerception,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::DecisionQuality => "decision_quality",
            Dimension::SkillDevelopment => "skill_development",
            Dimension::AiReliance => "ai_reliance",
            Dimension::BottleneckResolution => "bottleneck_resolution",
            Dimension::UserConfidence => "user_confidence",
            Dimension::Engagement => "engagement",
            Dimension::AutonomyPerception => "autonomy_perception",
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-interaction scores for all seven dimensions.
///
/// Field names match the wire payload exactly, so this deserializes
/// straight out of the `dimension_scores` object of a track request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub decision_quality: f64,
    pub skill_development: f64,
    pub ai_reliance: f64,
    pub bottleneck_resolution: f64,
    pub user_confidence: f64,
    pub engagement: f64,
    pub autonomy_perception: f64,
}

impl DimensionScores {
    /// Uniform scores across all dimensions.
    pub fn uniform(score: f64) -> Self {
        Self {
            decision_quality: score,
            skill_development: score,
            ai_reliance: score,
            bottleneck_resolution: score,
            user_confidence: score,
            engagement: score,
            autonomy_perception: score,
        }
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::DecisionQuality => self.decision_quality,
            Dimension::SkillDevelopment => self.skill_development,
            Dimension::AiReliance => self.ai_reliance,
            Dimension::BottleneckResolution => self.bottleneck_resolution,
            Dimension::UserConfidence => self.user_confidence,
            Dimension::Engagement => self.engagement,
            Dimension::AutonomyPerception => self.autonomy_perception,
        }
    }

    pub fn set(&mut self, dimension: Dimension, score: f64) {
        match dimension {
            Dimension::DecisionQuality => self.decision_quality = score,
            Dimension::SkillDevelopment => self.skill_development = score,
            Dimension::AiReliance => self.ai_reliance = score,
            Dimension::BottleneckResolution => self.bottleneck_resolution = score,
            Dimension::UserConfidence => self.user_confidence = score,
            Dimension::Engagement => self.engagement = score,
            Dimension::AutonomyPerception => self.autonomy_perception = score,
        }
    }

    /// Iterate (dimension, score) pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Dimension, f64)> + '_ {
        Dimension::ALL.iter().map(move |d| (*d, self.get(*d)))
    }

    /// Arithmetic mean of the seven dimension scores.
    pub fn mean(&self) -> f64 {
        self.iter().map(|(_, s)| s).sum::<f64>() / Dimension::ALL.len() as f64
    }

    /// Validate that every score lies in [0, 1].
    ///
    /// Out-of-range input is rejected before anything is persisted.
    pub fn validate(&self) -> AgsResult<()> {
        for (dimension, score) in self.iter() {
            if !(0.0..=1.0).contains(&score) || score.is_nan() {
                return Err(AgsError::InvalidInput(format!(
                    "dimension {} score {} outside [0, 1]",
                    dimension, score
                )));
            }
        }
        Ok(())
    }

    /// Dimensions scoring below the given floor.
    pub fn below_floor(&self, floor: f64) -> Vec<Dimension> {
        self.iter()
            .filter(|(_, s)| *s < floor)
            .map(|(d, _)| d)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn worked_example() -> DimensionScores {
        DimensionScores {
            decision_quality: 0.9,
            skill_development: 0.85,
            ai_reliance: 0.3,
            bottleneck_resolution: 0.82,
            user_confidence: 0.88,
            engagement: 0.87,
            autonomy_perception: 0.83,
        }
    }

    #[test]
    fn mean_of_worked_example() {
        let scores = worked_example();
        assert!((scores.mean() - 0.7786).abs() < 1e-4);
    }

    #[test]
    fn validate_rejects_out_of_range() {
        let mut scores = DimensionScores::uniform(0.5);
        scores.ai_reliance = 1.2;
        assert!(scores.validate().is_err());

        scores.ai_reliance = -0.1;
        assert!(scores.validate().is_err());

        scores.ai_reliance = f64::NAN;
        assert!(scores.validate().is_err());
    }

    #[test]
    fn below_floor_names_offending_dimensions() {
        let mut scores = DimensionScores::uniform(0.7);
        scores.engagement = 0.4;
        assert_eq!(scores.below_floor(0.5), vec![Dimension::Engagement]);
    }

    #[test]
    fn wire_field_names() {
        let json = serde_json::to_value(worked_example()).unwrap();
        assert_eq!(json["decision_quality"], 0.9);
        assert_eq!(json["autonomy_perception"], 0.83);
    }

    proptest! {
        #[test]
        fn mean_is_in_unit_interval(
            scores in proptest::collection::vec(0.0f64..=1.0, 7)
        ) {
            let mut s = DimensionScores::uniform(0.0);
            for (d, v) in Dimension::ALL.iter().zip(scores.iter()) {
                s.set(*d, *v);
            }
            prop_assert!(s.validate().is_ok());
            let mean = s.mean();
            prop_assert!((0.0..=1.0).contains(&mean));
            let expected = scores.iter().sum::<f64>() / 7.0;
            prop_assert!((mean - expected).abs() < 1e-12);
        }
    }
}
