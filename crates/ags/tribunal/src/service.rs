//! The tribunal service

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use ags_audit::{AuditEvent, AuditSeverity, AuditSink};
use ags_store::AppealStore;
use ags_types::{
    ActionId, AgsError, AgsResult, Appeal, AppealId, AppealStatus, Priority, UserId, Vote,
    MAX_REAPPEALS,
};

use crate::consensus::{tally, ConsensusOutcome};

/// Bounded optimistic-concurrency retries before giving up.
const MAX_CAS_ATTEMPTS: u32 = 5;

/// Reverses the disputed decision after an approved appeal.
///
/// The tribunal never mutates breaker or gate state itself; it asks
/// the owning engine through this seam.
#[async_trait]
pub trait BlockReversal: Send + Sync {
    /// Undo the disputed gate/breaker decision (the Override step).
    async fn reverse(&self, user: &UserId, action: &ActionId) -> AgsResult<()>;

    /// Return the user to their pre-block state (the Restore step).
    async fn restore(&self, user: &UserId) -> AgsResult<()>;
}

/// Opened when an approved appeal found harm already done.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RepairTicket {
    pub ticket_id: String,
    pub appeal_id: AppealId,
    pub user_id: UserId,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// What came of a vote or forced resolution.
#[derive(Clone, Debug)]
pub struct DecisionReport {
    pub appeal: Appeal,
    /// None while the appeal is still collecting votes
    pub outcome: Option<ConsensusOutcome>,
    /// Present when approval found prior harm to repair
    pub repair_ticket: Option<RepairTicket>,
}

/// Accepts appeals, runs the vote, executes approved overrides.
pub struct TribunalService {
    appeals: Arc<dyn AppealStore>,
    audit: Arc<dyn AuditSink>,
    reversal: Arc<dyn BlockReversal>,
}

impl TribunalService {
    pub fn new(
        appeals: Arc<dyn AppealStore>,
        audit: Arc<dyn AuditSink>,
        reversal: Arc<dyn BlockReversal>,
    ) -> Self {
        Self {
            appeals,
            audit,
            reversal,
        }
    }

    /// File an appeal against a governance decision. The appeal opens
    /// for voting immediately; its SLA deadline follows the priority.
    pub fn submit_appeal(
        &self,
        user_id: UserId,
        action_id: ActionId,
        ai_decision: impl Into<String>,
        user_complaint: impl Into<String>,
        priority: Priority,
    ) -> AgsResult<Appeal> {
        let mut appeal = Appeal::new(user_id, action_id, ai_decision, user_complaint, priority);
        self.appeals.insert(appeal.clone())?;
        appeal.transition(AppealStatus::Voting)?;
        self.appeals.put(appeal.clone(), 1)?;

        info!(appeal = %appeal.appeal_id, priority = ?appeal.priority, "appeal submitted");
        self.audit.record(
            AuditEvent::new("appeal_submitted", AuditSeverity::Info)
                .for_user(appeal.user_id.clone())
                .with_details(json!({
                    "appeal_id": appeal.appeal_id.as_str(),
                    "action_id": appeal.action_id.as_str(),
                    "priority": appeal.priority,
                })),
        );
        Ok(appeal)
    }

    pub fn get(&self, appeal_id: &AppealId) -> AgsResult<Appeal> {
        Ok(self
            .appeals
            .get(appeal_id)?
            .ok_or_else(|| AgsError::AppealNotFound(appeal_id.clone()))?
            .value)
    }

    /// Cast (or replace) one role's vote. When the seventh role votes,
    /// quorum is reached and the appeal is decided on the spot; an
    /// approved decision runs override, restore and repair before this
    /// call returns.
    pub async fn cast_vote(&self, appeal_id: &AppealId, vote: Vote) -> AgsResult<DecisionReport> {
        let (appeal, quorum) = self
            .update(appeal_id, |appeal| {
                if appeal.status != AppealStatus::Voting {
                    return Err(AgsError::InvalidInput(format!(
                        "appeal {} is not open for voting",
                        appeal.appeal_id
                    )));
                }
                if let Some(previous) = appeal.record_vote(vote.clone()) {
                    warn!(
                        appeal = %appeal.appeal_id,
                        role = ?vote.role,
                        previous = ?previous.decision,
                        replacement = ?vote.decision,
                        "duplicate vote replaced"
                    );
                }
                Ok(())
            })
            .map(|appeal| {
                let quorum = appeal.quorum_reached();
                (appeal, quorum)
            })?;

        self.audit.record(
            AuditEvent::new("vote_cast", AuditSeverity::Info)
                .for_user(appeal.user_id.clone())
                .with_details(json!({
                    "appeal_id": appeal.appeal_id.as_str(),
                    "role": vote.role,
                    "decision": vote.decision,
                })),
        );

        if quorum {
            return self.decide(appeal_id).await;
        }
        Ok(DecisionReport {
            appeal,
            outcome: None,
            repair_ticket: None,
        })
    }

    /// Force a decision on whatever votes exist, quorum or not.
    pub async fn resolve(&self, appeal_id: &AppealId) -> AgsResult<DecisionReport> {
        self.decide(appeal_id).await
    }

    async fn decide(&self, appeal_id: &AppealId) -> AgsResult<DecisionReport> {
        let appeal = self.update(appeal_id, |appeal| {
            let outcome = tally(appeal.votes.values());
            let to = match outcome {
                ConsensusOutcome::Approved => AppealStatus::DecidedApproved,
                ConsensusOutcome::Denied => AppealStatus::DecidedDenied,
                ConsensusOutcome::Escalated => AppealStatus::Escalated,
            };
            appeal.transition(to)
        })?;

        let outcome = match appeal.status {
            AppealStatus::DecidedApproved => ConsensusOutcome::Approved,
            AppealStatus::DecidedDenied => ConsensusOutcome::Denied,
            _ => ConsensusOutcome::Escalated,
        };
        info!(appeal = %appeal.appeal_id, outcome = ?outcome, "appeal decided");
        self.audit.record(
            AuditEvent::new("appeal_decided", AuditSeverity::Warning)
                .for_user(appeal.user_id.clone())
                .with_details(json!({
                    "appeal_id": appeal.appeal_id.as_str(),
                    "status": appeal.status,
                })),
        );

        if outcome == ConsensusOutcome::Approved {
            let (appeal, ticket) = self.execute_override(appeal).await?;
            return Ok(DecisionReport {
                appeal,
                outcome: Some(outcome),
                repair_ticket: ticket,
            });
        }
        Ok(DecisionReport {
            appeal,
            outcome: Some(outcome),
            repair_ticket: None,
        })
    }

    /// Override, restore, optional repair, then close.
    async fn execute_override(
        &self,
        appeal: Appeal,
    ) -> AgsResult<(Appeal, Option<RepairTicket>)> {
        self.reversal
            .reverse(&appeal.user_id, &appeal.action_id)
            .await?;
        self.reversal.restore(&appeal.user_id).await?;

        let ticket = appeal.harm_report.as_ref().map(|harm| RepairTicket {
            ticket_id: Uuid::new_v4().to_string(),
            appeal_id: appeal.appeal_id.clone(),
            user_id: appeal.user_id.clone(),
            description: harm.clone(),
            created_at: Utc::now(),
        });
        if let Some(ticket) = &ticket {
            info!(appeal = %appeal.appeal_id, ticket = %ticket.ticket_id, "repair ticket opened");
            self.audit.record(
                AuditEvent::new("repair_ticket_opened", AuditSeverity::Warning)
                    .for_user(appeal.user_id.clone())
                    .with_details(json!({
                        "appeal_id": appeal.appeal_id.as_str(),
                        "ticket_id": ticket.ticket_id,
                    })),
            );
        }

        let appeal = self.update(&appeal.appeal_id, |appeal| {
            appeal.transition(AppealStatus::Closed)
        })?;
        self.audit.record(
            AuditEvent::new("appeal_overridden", AuditSeverity::Warning)
                .for_user(appeal.user_id.clone())
                .with_details(json!({
                    "appeal_id": appeal.appeal_id.as_str(),
                    "action_id": appeal.action_id.as_str(),
                })),
        );
        Ok((appeal, ticket))
    }

    /// Re-open a denied appeal with new justification. Allowed twice;
    /// the third attempt escalates to manual review instead.
    pub fn re_appeal(
        &self,
        appeal_id: &AppealId,
        new_justification: impl Into<String>,
    ) -> AgsResult<Appeal> {
        let justification = new_justification.into();
        let exhausted = {
            let current = self.get(appeal_id)?;
            if current.status != AppealStatus::DecidedDenied {
                return Err(AgsError::InvalidTransition {
                    from: current.status,
                    to: AppealStatus::Voting,
                });
            }
            current.re_appeal_count >= MAX_REAPPEALS
        };

        if exhausted {
            let appeal = self.update(appeal_id, |appeal| {
                appeal.transition(AppealStatus::Escalated)
            })?;
            warn!(appeal = %appeal.appeal_id, "re-appeals exhausted, escalating");
            self.audit.record(
                AuditEvent::new("appeal_escalated", AuditSeverity::Warning)
                    .for_user(appeal.user_id.clone())
                    .with_details(json!({
                        "appeal_id": appeal.appeal_id.as_str(),
                        "re_appeal_count": appeal.re_appeal_count,
                    })),
            );
            return Err(AgsError::MaxReappealExceeded(appeal_id.clone()));
        }

        let appeal = self.update(appeal_id, |appeal| {
            appeal.re_appeal_count += 1;
            appeal.user_complaint.push_str("\n\nRe-appeal: ");
            appeal.user_complaint.push_str(&justification);
            appeal.clear_votes();
            appeal.sla_deadline = Utc::now() + appeal.priority.sla_window();
            appeal.transition(AppealStatus::Voting)
        })?;

        info!(appeal = %appeal.appeal_id, round = appeal.re_appeal_count, "re-appeal opened");
        self.audit.record(
            AuditEvent::new("appeal_reopened", AuditSeverity::Info)
                .for_user(appeal.user_id.clone())
                .with_details(json!({
                    "appeal_id": appeal.appeal_id.as_str(),
                    "re_appeal_count": appeal.re_appeal_count,
                })),
        );
        Ok(appeal)
    }

    /// Cancel an appeal before quorum. Only the submitting user may
    /// cancel; in-flight votes are discarded.
    pub fn cancel(&self, appeal_id: &AppealId, user: &UserId) -> AgsResult<Appeal> {
        let appeal = self.update(appeal_id, |appeal| {
            if appeal.user_id != *user {
                return Err(AgsError::CancelRefused(appeal.appeal_id.clone()));
            }
            if !appeal.status.is_outstanding() || appeal.quorum_reached() {
                return Err(AgsError::CancelRefused(appeal.appeal_id.clone()));
            }
            appeal.clear_votes();
            appeal.transition(AppealStatus::Closed)
        })?;

        info!(appeal = %appeal.appeal_id, "appeal cancelled by submitter");
        self.audit.record(
            AuditEvent::new("appeal_cancelled", AuditSeverity::Info)
                .for_user(appeal.user_id.clone())
                .with_details(json!({ "appeal_id": appeal.appeal_id.as_str() })),
        );
        Ok(appeal)
    }

    /// Attach a harm report. Consumed as a repair ticket if the appeal
    /// is later approved.
    pub fn report_harm(
        &self,
        appeal_id: &AppealId,
        description: impl Into<String>,
    ) -> AgsResult<Appeal> {
        let description = description.into();
        self.update(appeal_id, |appeal| {
            if appeal.status.is_terminal() {
                return Err(AgsError::InvalidInput(format!(
                    "appeal {} is closed",
                    appeal.appeal_id
                )));
            }
            appeal.harm_report = Some(description.clone());
            Ok(())
        })
    }

    /// Read-modify-write with optimistic concurrency, retried on
    /// version conflicts.
    fn update<F>(&self, appeal_id: &AppealId, mut mutate: F) -> AgsResult<Appeal>
    where
        F: FnMut(&mut Appeal) -> AgsResult<()>,
    {
        for _ in 0..MAX_CAS_ATTEMPTS {
            let versioned = self
                .appeals
                .get(appeal_id)?
                .ok_or_else(|| AgsError::AppealNotFound(appeal_id.clone()))?;
            let mut appeal = versioned.value;
            mutate(&mut appeal)?;
            match self.appeals.put(appeal.clone(), versioned.version) {
                Ok(_) => return Ok(appeal),
                Err(AgsError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(AgsError::VersionConflict {
            entity: format!("appeal {}", appeal_id),
            expected: 0,
            found: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use ags_audit::MemoryAuditSink;
    use ags_store::MemoryGovernanceStore;
    use ags_types::{StakeholderRole, VoteDecision};

    /// Records reversal calls for assertions.
    #[derive(Default)]
    struct RecordingReversal {
        reversed: Mutex<Vec<ActionId>>,
        restored: Mutex<Vec<UserId>>,
    }

    #[async_trait]
    impl BlockReversal for RecordingReversal {
        async fn reverse(&self, _user: &UserId, action: &ActionId) -> AgsResult<()> {
            self.reversed.lock().unwrap().push(action.clone());
            Ok(())
        }

        async fn restore(&self, user: &UserId) -> AgsResult<()> {
            self.restored.lock().unwrap().push(user.clone());
            Ok(())
        }
    }

    fn setup() -> (Arc<RecordingReversal>, Arc<MemoryAuditSink>, TribunalService) {
        let reversal = Arc::new(RecordingReversal::default());
        let audit = Arc::new(MemoryAuditSink::new());
        let service = TribunalService::new(
            Arc::new(MemoryGovernanceStore::new()),
            audit.clone(),
            reversal.clone(),
        );
        (reversal, audit, service)
    }

    fn submit(service: &TribunalService) -> Appeal {
        service
            .submit_appeal(
                UserId::new("u1"),
                ActionId::new("act-1"),
                "request blocked by extraction gate",
                "the flagged phrase was quoted documentation",
                Priority::Medium,
            )
            .unwrap()
    }

    async fn vote_all(
        service: &TribunalService,
        appeal_id: &AppealId,
        decisions: [VoteDecision; 7],
    ) -> DecisionReport {
        let mut last = None;
        for (role, decision) in StakeholderRole::ALL.into_iter().zip(decisions) {
            last = Some(
                service
                    .cast_vote(appeal_id, Vote::new(role, decision))
                    .await
                    .unwrap(),
            );
        }
        last.unwrap()
    }

    #[tokio::test]
    async fn five_approvals_override_and_close() {
        use VoteDecision::*;
        let (reversal, audit, service) = setup();
        let appeal = submit(&service);

        let report = vote_all(
            &service,
            &appeal.appeal_id,
            [Approve, Approve, Approve, Approve, Approve, Deny, Deny],
        )
        .await;

        assert_eq!(report.outcome, Some(ConsensusOutcome::Approved));
        assert_eq!(report.appeal.status, AppealStatus::Closed);
        assert!(report.repair_ticket.is_none());
        assert_eq!(reversal.reversed.lock().unwrap().len(), 1);
        assert_eq!(reversal.restored.lock().unwrap().len(), 1);
        assert_eq!(audit.of_type("appeal_overridden").len(), 1);
    }

    #[tokio::test]
    async fn four_approvals_deny() {
        use VoteDecision::*;
        let (reversal, _, service) = setup();
        let appeal = submit(&service);

        let report = vote_all(
            &service,
            &appeal.appeal_id,
            [Approve, Approve, Approve, Approve, Deny, Deny, Deny],
        )
        .await;

        assert_eq!(report.outcome, Some(ConsensusOutcome::Denied));
        assert_eq!(report.appeal.status, AppealStatus::DecidedDenied);
        assert!(reversal.reversed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_abstain_escalates_to_manual_review() {
        use VoteDecision::*;
        let (_, _, service) = setup();
        let appeal = submit(&service);

        let report = vote_all(
            &service,
            &appeal.appeal_id,
            [Abstain; 7],
        )
        .await;

        assert_eq!(report.outcome, Some(ConsensusOutcome::Escalated));
        assert_eq!(report.appeal.status, AppealStatus::Escalated);
    }

    #[tokio::test]
    async fn duplicate_vote_is_replaced_not_duplicated() {
        let (_, _, service) = setup();
        let appeal = submit(&service);

        service
            .cast_vote(
                &appeal.appeal_id,
                Vote::new(StakeholderRole::Developer, VoteDecision::Deny),
            )
            .await
            .unwrap();
        let report = service
            .cast_vote(
                &appeal.appeal_id,
                Vote::new(StakeholderRole::Developer, VoteDecision::Approve),
            )
            .await
            .unwrap();

        assert_eq!(report.appeal.votes.len(), 1);
        assert_eq!(
            report.appeal.votes[&StakeholderRole::Developer].decision,
            VoteDecision::Approve
        );
        assert!(report.outcome.is_none());
    }

    #[tokio::test]
    async fn harm_report_becomes_repair_ticket_on_approval() {
        use VoteDecision::*;
        let (_, audit, service) = setup();
        let appeal = submit(&service);
        service
            .report_harm(&appeal.appeal_id, "two days of blocked deploys")
            .unwrap();

        let report = vote_all(
            &service,
            &appeal.appeal_id,
            [Approve, Approve, Approve, Approve, Approve, Approve, Approve],
        )
        .await;

        let ticket = report.repair_ticket.expect("ticket");
        assert_eq!(ticket.appeal_id, appeal.appeal_id);
        assert_eq!(ticket.description, "two days of blocked deploys");
        assert_eq!(audit.of_type("repair_ticket_opened").len(), 1);
    }

    #[tokio::test]
    async fn re_appeal_twice_then_escalate() {
        use VoteDecision::*;
        let denial = [Approve, Approve, Approve, Approve, Deny, Deny, Deny];
        let (_, _, service) = setup();
        let appeal = submit(&service);

        vote_all(&service, &appeal.appeal_id, denial).await;
        let reopened = service
            .re_appeal(&appeal.appeal_id, "the block misread the context")
            .unwrap();
        assert_eq!(reopened.status, AppealStatus::Voting);
        assert_eq!(reopened.re_appeal_count, 1);
        assert!(reopened.votes.is_empty());

        vote_all(&service, &appeal.appeal_id, denial).await;
        service
            .re_appeal(&appeal.appeal_id, "new evidence attached")
            .unwrap();

        vote_all(&service, &appeal.appeal_id, denial).await;
        let err = service
            .re_appeal(&appeal.appeal_id, "third time")
            .unwrap_err();
        assert!(matches!(err, AgsError::MaxReappealExceeded(_)));
        assert_eq!(
            service.get(&appeal.appeal_id).unwrap().status,
            AppealStatus::Escalated
        );
    }

    #[tokio::test]
    async fn cancel_before_quorum_discards_votes() {
        let (_, _, service) = setup();
        let appeal = submit(&service);
        service
            .cast_vote(
                &appeal.appeal_id,
                Vote::new(StakeholderRole::EthicsBoard, VoteDecision::Approve),
            )
            .await
            .unwrap();

        let cancelled = service
            .cancel(&appeal.appeal_id, &UserId::new("u1"))
            .unwrap();
        assert_eq!(cancelled.status, AppealStatus::Closed);
        assert!(cancelled.votes.is_empty());
    }

    #[tokio::test]
    async fn cancel_by_someone_else_is_refused() {
        let (_, _, service) = setup();
        let appeal = submit(&service);
        let err = service
            .cancel(&appeal.appeal_id, &UserId::new("intruder"))
            .unwrap_err();
        assert!(matches!(err, AgsError::CancelRefused(_)));
    }

    #[tokio::test]
    async fn decided_appeal_rejects_further_votes() {
        use VoteDecision::*;
        let (_, _, service) = setup();
        let appeal = submit(&service);
        vote_all(
            &service,
            &appeal.appeal_id,
            [Approve, Approve, Approve, Approve, Deny, Deny, Deny],
        )
        .await;

        let err = service
            .cast_vote(
                &appeal.appeal_id,
                Vote::new(StakeholderRole::Developer, VoteDecision::Approve),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AgsError::InvalidInput(_)));
    }
}
