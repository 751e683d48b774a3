//! Audit events for governance decisions
//!
//! Every gate evaluation, breaker transition, and appeal transition
//! produces an event. Sinks are fire-and-forget from the engines'
//! perspective: recording must never block or fail the decision path,
//! so the `AuditSink` trait is synchronous and infallible. A sink that
//! cannot write swallows the failure and logs it.

#![deny(unsafe_code)]

use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ags_types::UserId;

/// Severity of an audit event.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum AuditSeverity {
    #[default]
    Info,
    Warning,
    Critical,
}

/// One audit record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    /// Machine-readable event type, e.g. "gate_evaluated",
    /// "breaker_tripped", "appeal_decided"
    pub event_type: String,
    pub severity: AuditSeverity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub timestamp: DateTime<Utc>,
    /// Free-form structured payload
    pub details: serde_json::Value,
}

impl AuditEvent {
    pub fn new(event_type: impl Into<String>, severity: AuditSeverity) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            event_type: event_type.into(),
            severity,
            user_id: None,
            timestamp: Utc::now(),
            details: serde_json::Value::Null,
        }
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Destination for audit events.
///
/// Implementations must not block; slow transports belong behind a
/// buffering sink, not in the decision path.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: AuditEvent);
}

/// Sink that keeps events in memory, for tests and inspection.
#[derive(Default)]
pub struct MemoryAuditSink {
    events: RwLock<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AuditEvent> {
        match self.events.read() {
            Ok(events) => events.clone(),
            Err(_) => Vec::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn of_type(&self, event_type: &str) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    pub fn critical(&self) -> Vec<AuditEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.severity == AuditSeverity::Critical)
            .collect()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: AuditEvent) {
        match self.events.write() {
            Ok(mut events) => events.push(event),
            Err(_) => {
                tracing::warn!(event_type = %event.event_type, "audit sink poisoned, event dropped")
            }
        }
    }
}

/// Sink that forwards events to `tracing` at mapped levels.
#[derive(Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: AuditEvent) {
        let user = event
            .user_id
            .as_ref()
            .map(|u| u.as_str())
            .unwrap_or("-");
        match event.severity {
            AuditSeverity::Info => {
                tracing::info!(event_type = %event.event_type, user = user, details = %event.details, "audit")
            }
            AuditSeverity::Warning => {
                tracing::warn!(event_type = %event.event_type, user = user, details = %event.details, "audit")
            }
            AuditSeverity::Critical => {
                tracing::error!(event_type = %event.event_type, user = user, details = %event.details, "audit")
            }
        }
    }
}

/// Sink that discards everything.
#[derive(Default)]
pub struct NullAuditSink;

impl AuditSink for NullAuditSink {
    fn record(&self, _event: AuditEvent) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn memory_sink_collects_events() {
        let sink = MemoryAuditSink::new();
        sink.record(
            AuditEvent::new("gate_evaluated", AuditSeverity::Info)
                .for_user(UserId::new("u1"))
                .with_details(json!({ "gate": "net_agency", "passed": true })),
        );
        sink.record(AuditEvent::new("breaker_tripped", AuditSeverity::Critical));

        assert_eq!(sink.count(), 2);
        assert_eq!(sink.of_type("gate_evaluated").len(), 1);
        assert_eq!(sink.critical().len(), 1);
    }

    #[test]
    fn event_serde_round_trip() {
        let event = AuditEvent::new("appeal_decided", AuditSeverity::Warning)
            .for_user(UserId::new("u1"))
            .with_details(json!({ "appeal_id": "ap-1", "decision": "approved" }));
        let json = serde_json::to_string(&event).unwrap();
        let restored: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, event);
    }
}
