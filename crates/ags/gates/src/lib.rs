//! Gate validator
//!
//! Every significant AI action passes through four independent safety
//! gates: Net Agency, Extraction Analysis, Humanity Override and
//! Performance Parity. The four evaluators are pure functions over a
//! shared immutable input and run as parallel tasks, joined before the
//! circuit breaker consumes the combined result. A failing gate is a
//! definitive per-request outcome, appealable only through the
//! tribunal; an evaluator that fails internally is treated fail-closed.

#![deny(unsafe_code)]

mod config;
mod evaluators;
mod input;
mod lexicon;
mod validator;

pub use config::GateConfig;
pub use input::{GateInput, ResponsePlan};
pub use lexicon::{LexiconEntry, scan_plan};
pub use validator::{GateReport, GateValidator};
