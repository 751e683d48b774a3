//! Shared immutable gate input
//!
//! Built once per request and handed to all four evaluators behind an
//! `Arc`. Nothing here is mutated during evaluation.

use serde::{Deserialize, Serialize};

use ags_types::{ActionId, AgencySnapshot, UserId};

/// The proposed response, as supplied by the model orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResponsePlan {
    /// Plan text scanned by the Extraction Analysis gate
    pub text: String,
    /// Whether the response exposes an explicit cancel/override control
    pub cancel_capability: bool,
}

impl ResponsePlan {
    pub fn new(text: impl Into<String>, cancel_capability: bool) -> Self {
        Self {
            text: text.into(),
            cancel_capability,
        }
    }
}

/// Everything the four gates see for one request.
#[derive(Clone, Debug)]
pub struct GateInput {
    pub action_id: ActionId,
    pub user_id: UserId,
    /// Latest snapshot for the user; None when nothing was ever tracked
    pub snapshot: Option<AgencySnapshot>,
    /// The snapshot before the latest, for computing agency deltas
    pub previous: Option<AgencySnapshot>,
    pub plan: ResponsePlan,
    pub estimated_latency_ms: u64,
    pub human_baseline_ms: u64,
    /// Beyond-Horizon Impact Ratio; > 1.0 excuses slow responses
    pub bhir: f64,
}
