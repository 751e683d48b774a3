//! Shared error type for the governance crates

use thiserror::Error;

use crate::appeal::AppealStatus;
use crate::ids::{AppealId, SessionId, UserId};

/// Errors raised anywhere in the governance pipeline.
#[derive(Debug, Error)]
pub enum AgsError {
    /// Malformed input; nothing was persisted
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no snapshots recorded for user {0}")]
    SnapshotNotFound(UserId),

    #[error("appeal not found: {0}")]
    AppealNotFound(AppealId),

    #[error("deep-dive session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("deep-dive session {0} already ended")]
    SessionClosed(SessionId),

    #[error("invalid appeal transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: AppealStatus,
        to: AppealStatus,
    },

    #[error("re-appeal limit exhausted for appeal {0}")]
    MaxReappealExceeded(AppealId),

    #[error("appeal {0} can no longer be cancelled")]
    CancelRefused(AppealId),

    /// Optimistic-concurrency check failed; the caller should re-read
    /// and retry
    #[error("version conflict on {entity}: expected {expected}, found {found}")]
    VersionConflict {
        entity: String,
        expected: u64,
        found: u64,
    },

    /// Persistence is unreachable; gating falls back to its
    /// conservative fail-closed policy
    #[error("persistence unavailable: {0}")]
    StoreUnavailable(String),
}

pub type AgsResult<T> = Result<T, AgsError>;
