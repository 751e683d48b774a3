//! Appeals tribunal
//!
//! Disputed gate and breaker decisions come here. Seven fixed
//! stakeholder roles vote over an SLA window; consensus needs
//! two-thirds of the non-abstaining votes. An approved appeal reverses
//! the original decision, restores the user and, when harm already
//! occurred, opens a repair ticket. Denied appeals may be re-appealed
//! twice before escalating to manual review.

#![deny(unsafe_code)]

mod consensus;
mod scheduler;
mod service;

pub use consensus::{tally, ConsensusOutcome};
pub use scheduler::SlaScheduler;
pub use service::{BlockReversal, DecisionReport, RepairTicket, TribunalService};
