//! SLA escalation scheduler
//!
//! A cooperative polling loop over outstanding appeals. An appeal past
//! its deadline gets its priority bumped one level and a fresh window
//! at the new priority; this is escalation, never a retry of the vote.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};

use ags_audit::{AuditEvent, AuditSeverity, AuditSink};
use ags_store::AppealStore;
use ags_types::{AgsError, AgsResult, AppealId};

/// Default polling period for the background loop.
pub const DEFAULT_POLL_PERIOD: Duration = Duration::from_secs(60);

pub struct SlaScheduler {
    appeals: Arc<dyn AppealStore>,
    audit: Arc<dyn AuditSink>,
}

impl SlaScheduler {
    pub fn new(appeals: Arc<dyn AppealStore>, audit: Arc<dyn AuditSink>) -> Self {
        Self { appeals, audit }
    }

    /// One scheduler pass. Returns the appeals escalated this tick.
    pub fn tick(&self, now: DateTime<Utc>) -> AgsResult<Vec<AppealId>> {
        let mut escalated = Vec::new();
        for versioned in self.appeals.outstanding()? {
            let mut appeal = versioned.value;
            if !appeal.sla_breached(now) {
                continue;
            }

            let old_priority = appeal.priority;
            appeal.priority = appeal.priority.bump();
            // Fresh window at the new priority so a stuck appeal
            // escalates once per window, not once per tick
            appeal.sla_deadline = now + appeal.priority.sla_window();
            appeal.updated_at = now;

            match self.appeals.put(appeal.clone(), versioned.version) {
                Ok(_) => {}
                // A voter got there first; the next tick re-examines
                Err(AgsError::VersionConflict { .. }) => continue,
                Err(e) => return Err(e),
            }

            warn!(
                appeal = %appeal.appeal_id,
                from = ?old_priority,
                to = ?appeal.priority,
                "sla breached, priority bumped"
            );
            self.audit.record(
                AuditEvent::new("appeal_sla_breached", AuditSeverity::Warning)
                    .for_user(appeal.user_id.clone())
                    .with_details(json!({
                        "appeal_id": appeal.appeal_id.as_str(),
                        "old_priority": old_priority,
                        "new_priority": appeal.priority,
                    })),
            );
            escalated.push(appeal.appeal_id);
        }
        Ok(escalated)
    }

    /// Background loop; runs until the task is dropped.
    pub async fn run(self: Arc<Self>, period: Duration) {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            match self.tick(Utc::now()) {
                Ok(escalated) if !escalated.is_empty() => {
                    debug!(count = escalated.len(), "sla scheduler escalated appeals");
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "sla scheduler pass failed"),
            }
        }
    }
}
