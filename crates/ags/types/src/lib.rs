//! Agency governance domain types
//!
//! Shared vocabulary for the governance pipeline: autonomy snapshots,
//! gate evaluations, circuit-breaker states, and appeals. Engines in the
//! other `ags-*` crates own the behavior; this crate owns the data model
//! and the invariants that travel with it.

#![deny(unsafe_code)]

mod appeal;
mod breaker;
mod dimensions;
mod errors;
mod gate;
mod ids;
mod profile;
mod snapshot;

pub use appeal::{
    Appeal, AppealStatus, Priority, StakeholderRole, Vote, VoteDecision, MAX_REAPPEALS,
};
pub use breaker::{BreakerScope, CircuitBreakerState, ThresholdsSnapshot};
pub use dimensions::{Dimension, DimensionScores};
pub use errors::{AgsError, AgsResult};
pub use gate::{GateEvaluation, GateName, Severity, Violation};
pub use ids::{ActionId, AppealId, SessionId, UserId};
pub use profile::{DifficultyLevel, KnowledgeProfile};
pub use snapshot::{AgencySnapshot, Trend};
