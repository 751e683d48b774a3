//! Governance facade
//!
//! Wires the full pipeline: the ARI engine measures the interaction,
//! the four gates validate the proposed response, the circuit breaker
//! aggregates the signals, and the tribunal stands by to reverse
//! disputed blocks. This is the crate embedding applications link
//! against; the engines underneath stay independently usable.

#![deny(unsafe_code)]

mod collaborators;
mod service;

pub use collaborators::{BhirSource, BreakerReversal, ModelOrchestrator, PlannedResponse};
pub use service::{GovernanceConfig, GovernanceService, InteractionOutcome};

/// Install a structured-logging subscriber honoring `RUST_LOG`.
/// Call once at startup from the embedding binary.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
