//! Persistence layer for governance state
//!
//! Traits for the three stores the engines need (snapshots, appeals,
//! breaker states) plus knowledge profiles, and an in-memory
//! implementation used by tests and single-process deployments.
//!
//! Appeals use optimistic concurrency: every write carries the version
//! the writer read, and a mismatch is a `VersionConflict` the caller
//! resolves by re-reading and retrying. Snapshots are append-only and
//! never rewritten, so they carry no version.

#![deny(unsafe_code)]

mod memory;
mod traits;
mod versioned;

pub use memory::MemoryGovernanceStore;
pub use traits::{AppealStore, BreakerStore, ProfileStore, SnapshotStore};
pub use versioned::Versioned;
