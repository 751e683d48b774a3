//! Epistemic-debt collaborator

use async_trait::async_trait;

use ags_types::{AgsResult, UserId};

/// External epistemic-debt monitor consumed as a trip signal.
#[async_trait]
pub trait EdmProbe: Send + Sync {
    /// Count of unresolved high-severity debt items for a user.
    async fn unresolved_high_severity_debt_count(&self, user: &UserId) -> AgsResult<u64>;
}
