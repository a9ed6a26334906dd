//! Gate engine, evidence aggregator and transition controller
//!
//! The engine re-evaluates a candidate's admission gates whenever new
//! evidence arrives and drives the state machine:
//!
//! - [`evidence`] accumulates partial, out-of-order evidence fragments and
//!   recomputes the joint derived metric once enough have arrived.
//! - [`GateEngine`] evaluates the named gates, each producing one of
//!   `unresolved | passed | failed` and reading only its own candidate
//!   fields, never another gate's in-flight result.
//! - [`TransitionController`] aggregates gate outcomes into a transition
//!   decision: advance (with a notification), reject, or wait.
//!
//! Gate evaluation order is fixed and deterministic. A gate failure
//! short-circuits the pass; unanimity is required to advance.

#![deny(unsafe_code)]

mod controller;
pub mod evidence;
mod gates;

pub use controller::{PassOutcome, TransitionController};
pub use gates::{CoincidenceError, CoincidenceSource, CoincidentMarker, GateEngine};
