//! Circuit breaker
//!
//! Aggregates agency snapshots, gate results, epistemic-debt counts
//! and the beyond-horizon impact ratio into trip decisions, scoped to
//! one user or to the whole system. While a scope is tripped every
//! request in it short-circuits to a paused result; clearing happens
//! only through a tribunal override or an explicit administrative
//! reset, never on a timer.

#![deny(unsafe_code)]

mod config;
mod engine;
mod probe;

pub use config::BreakerConfig;
pub use engine::CircuitBreaker;
pub use probe::EdmProbe;
