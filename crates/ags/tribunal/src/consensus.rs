//! Consensus reducer
//!
//! Approval needs two-thirds of the votes actually taking a side;
//! abstains shrink the denominator. A quorum where every role
//! abstained escalates to manual review instead of auto-denying.

use ags_types::{Vote, VoteDecision};

/// Approval fraction of non-abstaining votes.
const APPROVAL_FRACTION: f64 = 0.66;

/// What the cast votes add up to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsensusOutcome {
    Approved,
    Denied,
    /// Every vote was an abstention; a human has to look
    Escalated,
}

/// Reduce a set of votes to a decision.
pub fn tally<'a>(votes: impl IntoIterator<Item = &'a Vote>) -> ConsensusOutcome {
    let mut approves = 0usize;
    let mut denies = 0usize;
    for vote in votes {
        match vote.decision {
            VoteDecision::Approve => approves += 1,
            VoteDecision::Deny => denies += 1,
            VoteDecision::Abstain => {}
        }
    }

    let deciding = approves + denies;
    if deciding == 0 {
        return ConsensusOutcome::Escalated;
    }

    let needed = (APPROVAL_FRACTION * deciding as f64).ceil() as usize;
    if approves >= needed && approves >= 1 {
        ConsensusOutcome::Approved
    } else {
        ConsensusOutcome::Denied
    }
}
