//! ARI engine - Autonomy Retention Index
//!
//! Measures, per interaction, whether AI assistance is growing or
//! eroding a user's own capability. Three measurement layers feed the
//! seven dimension scores: a passive lexical layer running in the
//! background, the Socratic co-pilot probing capability checkpoints
//! during tasks, and opt-in Deep-Dive baseline sessions.
//!
//! The engine owns per-user snapshot history (append-only, via the
//! snapshot store) and serializes updates per user so concurrent
//! interactions from the same user cannot lose writes.

#![deny(unsafe_code)]

mod config;
mod copilot;
mod deepdive;
mod deskilling;
mod engine;
mod passive;
mod stats;
mod trajectory;

pub use config::AriConfig;
pub use copilot::{
    Checkpoint, CheckpointOutcome, CheckpointResult, CopilotReport, SocraticCopilot, TaskCategory,
};
pub use deepdive::{DeepDiveSession, DeepDiveStep, QualityBucket, StepOutcome, SynthesisRubric};
pub use deskilling::{DeskillingAlert, DeskillingSeverity};
pub use engine::{AriEngine, TrackRequest};
pub use passive::PassiveLexicalLayer;
pub use trajectory::{SkillTrajectory, TrajectoryPoint};
