//! Store traits consumed by the governance engines

use ags_types::{
    AgencySnapshot, AgsResult, Appeal, AppealId, BreakerScope, CircuitBreakerState,
    KnowledgeProfile, UserId,
};

use crate::versioned::Versioned;

/// Ordered, append-only per-user snapshot log.
pub trait SnapshotStore: Send + Sync {
    /// Append a snapshot to the user's history.
    fn append(&self, snapshot: AgencySnapshot) -> AgsResult<()>;

    /// Full ordered history for a user (oldest first).
    fn history(&self, user: &UserId) -> AgsResult<Vec<AgencySnapshot>>;

    /// The most recent snapshot, if any.
    fn latest(&self, user: &UserId) -> AgsResult<Option<AgencySnapshot>>;

    /// The most recent `n` snapshots (oldest first).
    fn recent(&self, user: &UserId, n: usize) -> AgsResult<Vec<AgencySnapshot>>;
}

/// Knowledge profiles keyed by (user, domain).
pub trait ProfileStore: Send + Sync {
    fn get(&self, user: &UserId, domain: &str) -> AgsResult<Option<KnowledgeProfile>>;
    fn put(&self, profile: KnowledgeProfile) -> AgsResult<()>;
}

/// Appeal records keyed by appeal id, with optimistic concurrency.
pub trait AppealStore: Send + Sync {
    /// Insert a brand-new appeal at version 1.
    fn insert(&self, appeal: Appeal) -> AgsResult<()>;

    fn get(&self, appeal_id: &AppealId) -> AgsResult<Option<Versioned<Appeal>>>;

    /// Replace the appeal, checking the version the writer read.
    /// Returns the new version on success.
    fn put(&self, appeal: Appeal, expected_version: u64) -> AgsResult<u64>;

    /// Appeals still awaiting a decision, for the SLA scheduler.
    fn outstanding(&self) -> AgsResult<Vec<Versioned<Appeal>>>;
}

/// Breaker states keyed by scope. Only the breaker engine writes here.
pub trait BreakerStore: Send + Sync {
    fn get(&self, scope: &BreakerScope) -> AgsResult<Option<CircuitBreakerState>>;

    /// Record a trip. Idempotent per scope: returns false (and leaves
    /// the existing record untouched) when the scope is already active.
    fn trip(&self, state: CircuitBreakerState) -> AgsResult<bool>;

    /// Clear an active state. Returns false when nothing was active.
    fn clear(&self, scope: &BreakerScope) -> AgsResult<bool>;

    /// All currently active states.
    fn active(&self) -> AgsResult<Vec<CircuitBreakerState>>;
}
