//! Appeals and stakeholder votes
//!
//! An Appeal is a dispute over a gate or breaker decision. Its status
//! moves through an explicit finite-state machine; every mutation is
//! validated against the allowed-transition table below.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{AgsError, AgsResult};
use crate::ids::{ActionId, AppealId, UserId};

/// Maximum number of re-appeals after a denial.
pub const MAX_REAPPEALS: u32 = 2;

/// Appeal priority, which determines the SLA window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
    Critical,
}

impl Priority {
    /// How long the tribunal has before the appeal breaches its SLA.
    pub fn sla_window(&self) -> Duration {
        match self {
            Priority::Critical => Duration::hours(6),
            Priority::High => Duration::days(1),
            Priority::Medium => Duration::days(3),
            Priority::Low => Duration::days(7),
        }
    }

    /// One level more urgent; Critical stays Critical.
    pub fn bump(&self) -> Priority {
        match self {
            Priority::Low => Priority::Medium,
            Priority::Medium => Priority::High,
            Priority::High | Priority::Critical => Priority::Critical,
        }
    }
}

/// The seven fixed stakeholder roles on the tribunal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeholderRole {
    UserAdvocate,
    Developer,
    EthicsBoard,
    DomainExpert,
    CommunityRep,
    OpsSupport,
    ProductOwner,
}

impl StakeholderRole {
    pub const ALL: [StakeholderRole; 7] = [
        StakeholderRole::UserAdvocate,
        StakeholderRole::Developer,
        StakeholderRole::EthicsBoard,
        StakeholderRole::DomainExpert,
        StakeholderRole::CommunityRep,
        StakeholderRole::OpsSupport,
        StakeholderRole::ProductOwner,
    ];
}

/// A stakeholder's position on an appeal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteDecision {
    Approve,
    Deny,
    Abstain,
}

/// One vote, immutable once cast. A second vote from the same role
/// replaces the first wholesale (idempotent upsert), it never merges.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub role: StakeholderRole,
    pub decision: VoteDecision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    pub cast_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(role: StakeholderRole, decision: VoteDecision) -> Self {
        Self {
            role,
            decision,
            rationale: None,
            cast_at: Utc::now(),
        }
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }
}

/// Lifecycle states of an appeal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppealStatus {
    Pending,
    Voting,
    DecidedApproved,
    DecidedDenied,
    Escalated,
    Closed,
}

impl AppealStatus {
    /// The allowed-transition table. Anything not listed here is an
    /// invalid mutation and is rejected.
    pub fn can_transition(from: AppealStatus, to: AppealStatus) -> bool {
        use AppealStatus::*;
        matches!(
            (from, to),
            (Pending, Voting)
                | (Pending, Closed)           // cancelled before voting
                | (Voting, DecidedApproved)
                | (Voting, DecidedDenied)
                | (Voting, Escalated)         // all-abstain quorum
                | (Voting, Closed)            // cancelled before quorum
                | (DecidedApproved, Closed)   // override/restore/repair done
                | (DecidedDenied, Voting)     // re-appeal
                | (DecidedDenied, Escalated)  // re-appeals exhausted
                | (Escalated, Closed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppealStatus::Closed)
    }

    /// Still awaiting a tribunal decision (tracked by the SLA scheduler).
    pub fn is_outstanding(&self) -> bool {
        matches!(self, AppealStatus::Pending | AppealStatus::Voting)
    }
}

/// A dispute over a gate or breaker decision.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Appeal {
    pub appeal_id: AppealId,
    pub user_id: UserId,
    /// The governance action being disputed
    pub action_id: ActionId,
    /// What the system decided (human-readable, for the voters)
    pub ai_decision: String,
    /// The user's complaint; re-appeal justifications are appended
    pub user_complaint: String,
    pub priority: Priority,
    pub status: AppealStatus,
    /// One vote per role, keyed by role
    pub votes: HashMap<StakeholderRole, Vote>,
    /// Number of re-appeals used so far (at most MAX_REAPPEALS)
    pub re_appeal_count: u32,
    pub sla_deadline: DateTime<Utc>,
    /// Set via report_harm; drives repair-ticket creation on approval
    #[serde(skip_serializing_if = "Option::is_none")]
    pub harm_report: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appeal {
    pub fn new(
        user_id: UserId,
        action_id: ActionId,
        ai_decision: impl Into<String>,
        user_complaint: impl Into<String>,
        priority: Priority,
    ) -> Self {
        let now = Utc::now();
        Self {
            appeal_id: AppealId::generate(),
            user_id,
            action_id,
            ai_decision: ai_decision.into(),
            user_complaint: user_complaint.into(),
            priority,
            status: AppealStatus::Pending,
            votes: HashMap::new(),
            re_appeal_count: 0,
            sla_deadline: now + priority.sla_window(),
            harm_report: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Move to a new status, validated against the transition table.
    pub fn transition(&mut self, to: AppealStatus) -> AgsResult<()> {
        if !AppealStatus::can_transition(self.status, to) {
            return Err(AgsError::InvalidTransition {
                from: self.status,
                to,
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Upsert a vote. Returns the previous vote when the role had
    /// already voted (the caller logs the overwrite; it is not an error).
    pub fn record_vote(&mut self, vote: Vote) -> Option<Vote> {
        self.updated_at = Utc::now();
        self.votes.insert(vote.role, vote)
    }

    /// Quorum is reached when every role has voted.
    pub fn quorum_reached(&self) -> bool {
        self.votes.len() == StakeholderRole::ALL.len()
    }

    /// Discard in-flight votes (cancel, or reset for a re-appeal round).
    pub fn clear_votes(&mut self) {
        self.votes.clear();
        self.updated_at = Utc::now();
    }

    pub fn sla_breached(&self, now: DateTime<Utc>) -> bool {
        self.status.is_outstanding() && now > self.sla_deadline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_appeal() -> Appeal {
        Appeal::new(
            UserId::new("u1"),
            ActionId::new("act-1"),
            "request blocked by extraction gate",
            "the flagged phrase was quoted documentation",
            Priority::Medium,
        )
    }

    #[test]
    fn sla_deadline_follows_priority() {
        let appeal = make_appeal();
        let expected = appeal.created_at + Duration::days(3);
        assert_eq!(appeal.sla_deadline, expected);

        let critical = Appeal::new(
            UserId::new("u1"),
            ActionId::new("act-2"),
            "decision",
            "complaint",
            Priority::Critical,
        );
        assert_eq!(critical.sla_deadline, critical.created_at + Duration::hours(6));
    }

    #[test]
    fn transition_table_rejects_illegal_moves() {
        let mut appeal = make_appeal();
        assert!(appeal.transition(AppealStatus::DecidedApproved).is_err());
        appeal.transition(AppealStatus::Voting).unwrap();
        assert!(appeal.transition(AppealStatus::Pending).is_err());
        appeal.transition(AppealStatus::DecidedDenied).unwrap();
        appeal.transition(AppealStatus::Voting).unwrap();
    }

    #[test]
    fn vote_upsert_is_idempotent() {
        let mut appeal = make_appeal();
        appeal
            .record_vote(Vote::new(StakeholderRole::Developer, VoteDecision::Deny));
        let previous = appeal.record_vote(Vote::new(
            StakeholderRole::Developer,
            VoteDecision::Approve,
        ));

        assert!(previous.is_some());
        assert_eq!(appeal.votes.len(), 1);
        assert_eq!(
            appeal.votes[&StakeholderRole::Developer].decision,
            VoteDecision::Approve
        );
    }

    #[test]
    fn quorum_requires_all_seven_roles() {
        let mut appeal = make_appeal();
        for role in StakeholderRole::ALL.iter().take(6) {
            appeal.record_vote(Vote::new(*role, VoteDecision::Approve));
        }
        assert!(!appeal.quorum_reached());
        appeal.record_vote(Vote::new(
            StakeholderRole::ProductOwner,
            VoteDecision::Abstain,
        ));
        assert!(appeal.quorum_reached());
    }

    #[test]
    fn priority_bump_saturates_at_critical() {
        assert_eq!(Priority::Low.bump(), Priority::Medium);
        assert_eq!(Priority::High.bump(), Priority::Critical);
        assert_eq!(Priority::Critical.bump(), Priority::Critical);
    }

    #[test]
    fn serde_round_trip_preserves_fields() {
        let mut appeal = make_appeal();
        appeal.transition(AppealStatus::Voting).unwrap();
        appeal.record_vote(
            Vote::new(StakeholderRole::EthicsBoard, VoteDecision::Approve)
                .with_rationale("block was overbroad"),
        );

        let json = serde_json::to_string(&appeal).unwrap();
        let restored: Appeal = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, appeal);
    }
}
