//! Socratic co-pilot layer
//!
//! During task delegation the co-pilot identifies 2-4 Unassisted
//! Capability Checkpoints (UCCs) for the task category, probes each
//! with a clarifying question, and classifies the user's answer.
//! The request-level ARI contribution is the mean checkpoint
//! capability score.

use serde::{Deserialize, Serialize};

/// Task categories the co-pilot knows checkpoint plans for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskCategory {
    Code,
    Writing,
    Analysis,
}

/// One capability probe point.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    /// The clarifying question put to the user
    pub prompt: String,
    /// Capability credited when the user genuinely answers, in [0, 1]
    pub expected_knowledge_level: f64,
}

impl Checkpoint {
    fn new(id: &str, prompt: &str, expected: f64) -> Self {
        Self {
            id: id.to_string(),
            prompt: prompt.to_string(),
            expected_knowledge_level: expected,
        }
    }
}

/// How a checkpoint response was classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointOutcome {
    /// The user supplied the knowledge themselves
    Provided,
    /// A thin or incomplete answer
    Partial,
    /// The user handed the decision back to the assistant
    Delegated,
}

/// Classification of one checkpoint response.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CheckpointResult {
    pub checkpoint_id: String,
    pub outcome: CheckpointOutcome,
    pub capability_score: f64,
}

/// Request-level summary handed to the ARI engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CopilotReport {
    pub category: TaskCategory,
    pub results: Vec<CheckpointResult>,
    /// Mean checkpoint capability score, the layer's ARI contribution
    pub contribution: f64,
    /// Checkpoints scoring >= 0.7
    pub high_count: usize,
    /// Checkpoints scoring <= 0.3
    pub low_count: usize,
}

/// Capability credited to a delegated answer.
const DELEGATED_SCORE: f64 = 0.1;

/// Responses shorter than this many words are classified Partial.
const PARTIAL_WORD_FLOOR: usize = 8;

/// The co-pilot: checkpoint planning and response classification.
pub struct SocraticCopilot {
    delegation_phrases: Vec<&'static str>,
}

impl Default for SocraticCopilot {
    fn default() -> Self {
        Self {
            // Fixed delegation-phrase lexicon
            delegation_phrases: vec![
                "just guess",
                "you decide",
                "i don't know",
                "i dont know",
                "idk",
                "whatever you think",
                "you pick",
                "do it for me",
                "doesn't matter",
            ],
        }
    }
}

impl SocraticCopilot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The fixed checkpoint plan for a category (2-4 checkpoints).
    pub fn plan_checkpoints(&self, category: TaskCategory) -> Vec<Checkpoint> {
        match category {
            TaskCategory::Code => vec![
                Checkpoint::new(
                    "code-approach",
                    "What approach would you take before I write anything?",
                    0.8,
                ),
                Checkpoint::new(
                    "code-datastructure",
                    "Which data structure fits here, and why?",
                    0.75,
                ),
                Checkpoint::new(
                    "code-edge-cases",
                    "What edge cases should the implementation handle?",
                    0.7,
                ),
                Checkpoint::new(
                    "code-verification",
                    "How would you verify the result is correct?",
                    0.7,
                ),
            ],
            TaskCategory::Writing => vec![
                Checkpoint::new(
                    "writing-audience",
                    "Who is the audience and what should they take away?",
                    0.8,
                ),
                Checkpoint::new(
                    "writing-structure",
                    "How would you structure the argument?",
                    0.75,
                ),
                Checkpoint::new(
                    "writing-evidence",
                    "What evidence supports the main claim?",
                    0.7,
                ),
            ],
            TaskCategory::Analysis => vec![
                Checkpoint::new(
                    "analysis-hypothesis",
                    "What outcome do you expect, and why?",
                    0.8,
                ),
                Checkpoint::new(
                    "analysis-method",
                    "What method would you use to test that?",
                    0.75,
                ),
                Checkpoint::new(
                    "analysis-confound",
                    "What could confound the result?",
                    0.7,
                ),
            ],
        }
    }

    /// Classify one response against its checkpoint.
    pub fn classify_response(&self, checkpoint: &Checkpoint, response: &str) -> CheckpointResult {
        let lower = response.trim().to_lowercase();

        if self.delegation_phrases.iter().any(|p| lower.contains(p)) {
            return CheckpointResult {
                checkpoint_id: checkpoint.id.clone(),
                outcome: CheckpointOutcome::Delegated,
                capability_score: DELEGATED_SCORE,
            };
        }

        if lower.split_whitespace().count() < PARTIAL_WORD_FLOOR {
            return CheckpointResult {
                checkpoint_id: checkpoint.id.clone(),
                outcome: CheckpointOutcome::Partial,
                capability_score: checkpoint.expected_knowledge_level * 0.5,
            };
        }

        CheckpointResult {
            checkpoint_id: checkpoint.id.clone(),
            outcome: CheckpointOutcome::Provided,
            capability_score: checkpoint.expected_knowledge_level,
        }
    }

    /// Run the full probe for a request. Responses are paired with the
    /// category's checkpoints in order; an unanswered checkpoint counts
    /// as delegated.
    pub fn assess(&self, category: TaskCategory, responses: &[String]) -> CopilotReport {
        let checkpoints = self.plan_checkpoints(category);
        let results: Vec<CheckpointResult> = checkpoints
            .iter()
            .enumerate()
            .map(|(i, checkpoint)| match responses.get(i) {
                Some(response) => self.classify_response(checkpoint, response),
                None => CheckpointResult {
                    checkpoint_id: checkpoint.id.clone(),
                    outcome: CheckpointOutcome::Delegated,
                    capability_score: DELEGATED_SCORE,
                },
            })
            .collect();

        let contribution = if results.is_empty() {
            0.0
        } else {
            results.iter().map(|r| r.capability_score).sum::<f64>() / results.len() as f64
        };
        let high_count = results.iter().filter(|r| r.capability_score >= 0.7).count();
        let low_count = results.iter().filter(|r| r.capability_score <= 0.3).count();

        CopilotReport {
            category,
            results,
            contribution,
            high_count,
            low_count,
        }
    }
}
